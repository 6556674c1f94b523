use std::io::{self, Write};

/// Textual progress bar rendered to stderr.
///
/// Redraws in place with a carriage return on every update; a partial cell
/// at the bar's tip steps through ` -=o` before becoming a full `#`. Prints
/// a final newline when dropped so subsequent output starts clean.
pub struct Progress {
	count: usize,
	total: usize,
	width: usize,
}

impl Progress {
	pub fn new(total: usize) -> Self {
		let mut progress = Self { count: 0, total, width: 80 };
		progress.update();
		progress
	}

	/// Sets the absolute progress count and redraws.
	pub fn set(&mut self, count: usize) {
		self.count = count;
		self.update();
	}

	/// Advances the progress count and redraws.
	pub fn add(&mut self, count: usize) {
		self.count += count;
		self.update();
	}

	fn update(&self) {
		const PRECISION: usize = 2;
		const GLYPHS: [char; 4] = [' ', '-', '=', 'o'];

		let progress = self.count.min(self.total) as f32 / self.total as f32;
		let percent = progress * 100.0;
		let bar_max_width = self.width - 8 - PRECISION;
		let bar_width = (bar_max_width as f32 * progress) as usize;
		let mut bar = "#".repeat(bar_width);
		let partial = bar_max_width as f32 * progress - bar_width as f32;
		if partial > 0.0 {
			let index = (partial * GLYPHS.len() as f32) as usize;
			bar.push(GLYPHS[index]);
		}
		let filled = bar.chars().count();
		bar.push_str(&" ".repeat(bar_max_width - filled));

		eprint!("\r[{}] {:>6.2}%", bar, percent);
		let _ = io::stderr().flush();
	}
}

impl Drop for Progress {
	fn drop(&mut self) {
		eprintln!();
	}
}
