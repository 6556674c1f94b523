use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Separator between examples in a corpus file.
pub const CORPUS_DELIMITER: &str = "\n#SEP#\n";

/// Reads a corpus file and splits it into examples.
///
/// - Reads the entire file into memory (UTF-8)
/// - Splits on `CORPUS_DELIMITER`
pub fn load_corpus<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.split(CORPUS_DELIMITER).map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/train.txt` + `"bin"` → `data/train.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}
