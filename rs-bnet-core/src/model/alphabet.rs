use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Start-of-text sentinel (U+0002, Start of Text).
pub const BEG_STRING: char = '\u{0002}';
/// End-of-text sentinel (U+0003, End of Text).
pub const END_STRING: char = '\u{0003}';
/// Unknown-symbol sentinel (U+001A, Substitute).
pub const UNKNOWN: char = '\u{001a}';

/// Bidirectional mapping between characters and dense serial indices.
///
/// An `Alphabet` assigns every distinct training symbol, plus the three
/// reserved sentinels, a unique index in `[0, size)`. The sentinels occupy
/// indices 0, 1 and 2; the remaining symbols are assigned in sorted order
/// so an alphabet rebuilt from the same corpus is identical.
///
/// # Invariants
/// - The mapping is a bijection between stored symbols and `[0, size)`
/// - `serialize` never fails: unmapped symbols resolve to the unknown index
/// - No mutation after construction
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Alphabet {
	/// Symbol to serial index.
	true_to_serial: HashMap<char, u32>,
	/// Serial index to symbol; the dense side of the bijection.
	serial_to_true: Vec<char>,
}

impl Alphabet {
	/// Builds an alphabet from the set of distinct symbols of a corpus.
	///
	/// # Panics
	/// Panics if the symbol set contains one of the reserved sentinels;
	/// the corpus loader is expected to never produce them.
	pub fn new(symbols: &HashSet<char>) -> Self {
		let mut alphabet = Self {
			true_to_serial: HashMap::with_capacity(symbols.len() + 3),
			serial_to_true: Vec::with_capacity(symbols.len() + 3),
		};

		for sentinel in [BEG_STRING, END_STRING, UNKNOWN] {
			assert!(
				!symbols.contains(&sentinel),
				"reserved sentinel {:?} present in the symbol set",
				sentinel
			);
			alphabet.push_symbol(sentinel);
		}

		let mut sorted: Vec<char> = symbols.iter().copied().collect();
		sorted.sort_unstable();
		for c in sorted {
			alphabet.push_symbol(c);
		}

		alphabet
	}

	/// Builds an alphabet from every distinct character of a corpus.
	pub fn from_corpus(corpus: &[String]) -> Self {
		let mut letters = HashSet::new();
		for s in corpus {
			letters.extend(s.chars());
		}
		Self::new(&letters)
	}

	fn push_symbol(&mut self, c: char) {
		let sc = self.serial_to_true.len() as u32;
		self.true_to_serial.insert(c, sc);
		self.serial_to_true.push(c);
	}

	/// Returns the serial index of `c`, or the unknown index for symbols
	/// that were not part of the training set.
	pub fn serialize(&self, c: char) -> u32 {
		match self.true_to_serial.get(&c) {
			Some(sc) => *sc,
			None => self.true_to_serial[&UNKNOWN],
		}
	}

	/// Returns the symbol stored at serial index `sc`.
	///
	/// # Panics
	/// Panics if `sc` is outside `[0, size)`. Indices obtained from
	/// `serialize` are always in range.
	pub fn deserialize(&self, sc: u32) -> char {
		self.serial_to_true[sc as usize]
	}

	/// Total number of indices, sentinels included.
	pub fn size(&self) -> u32 {
		self.serial_to_true.len() as u32
	}
}
