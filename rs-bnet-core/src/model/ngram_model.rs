use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::alphabet::{Alphabet, BEG_STRING};
use crate::model::{Model, State};

/// Additive smoothing mass applied to every symbol of a matched context.
const SMOOTHING: f64 = 0.01;

/// One transition record in the trie: how often the symbol occurred at this
/// depth, and the index of its child map. `next == 0` means no child (map 0
/// is the root and is never referenced as a child).
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
struct Entry {
	count: usize,
	next: usize,
}

/// Fixed-order n-gram model over serial indices.
///
/// Contexts of length `n - 1` are stored in a flat vector of maps forming a
/// trie: walking a context symbol by symbol from the root yields the map of
/// next-symbol counts. Prediction backs off from the longest available
/// context to shorter ones and smooths the matched map's counts.
///
/// # Responsibilities
/// - Accumulate transition counts along every suffix of the training window
/// - Predict the next symbol with add-constant smoothing and backoff
/// - Merge with another model of the same order
/// - Round-trip through a compact binary cache for fast reloading
///
/// # Invariants
/// - `n` is always >= 2
/// - Map 0 is the root; child map indices are always > 0
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// The order of the model (context length is `n - 1`).
	n: usize,
	alphabet: Alphabet,
	maps: Vec<HashMap<u32, Entry>>,
}

impl NGramModel {
	/// Creates an empty n-gram model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 2`.
	pub fn new(n: usize, alphabet: Alphabet) -> Result<Self, String> {
		if n < 2 {
			return Err("n must be >= 2".to_owned());
		}
		Ok(Self { n, alphabet, maps: vec![HashMap::new()] })
	}

	/// The order of the model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Loads a model from a postcard binary cache, if one exists.
	///
	/// Returns `Ok(None)` when the cache file is absent so the caller can
	/// fall back to training from the raw corpus.
	pub fn from_cache<P: AsRef<Path>>(path: P) -> Result<Option<Self>, Box<dyn Error>> {
		if !path.as_ref().exists() {
			return Ok(None);
		}
		let bytes = std::fs::read(path)?;
		Ok(Some(postcard::from_bytes(&bytes)?))
	}

	/// Serializes the model to a compact binary cache for future fast loading.
	pub fn save_cache<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Merges another model of the same order into this one.
	///
	/// Transition counts for matching contexts are summed; contexts missing
	/// on either side are copied over.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.n != other.n {
			return Err("N mismatch".to_owned());
		}
		self.merge_maps(0, other, 0);
		Ok(())
	}

	/// Recursively folds `other.maps[from]` into `self.maps[into]`,
	/// allocating child maps on demand.
	fn merge_maps(&mut self, into: usize, other: &Self, from: usize) {
		for (&sc, &entry) in &other.maps[from] {
			let next_free = self.maps.len();
			let own = self.maps[into].entry(sc).or_insert(Entry { count: 0, next: 0 });
			own.count += entry.count;
			if entry.next != 0 && own.next == 0 {
				own.next = next_free;
			}
			let child_into = own.next;
			if child_into == next_free {
				self.maps.push(HashMap::new());
			}
			if entry.next != 0 {
				self.merge_maps(child_into, other, entry.next);
			}
		}
	}

	/// Sum of the transition counts in one trie map.
	fn map_total(map: &HashMap<u32, Entry>) -> usize {
		map.values().map(|entry| entry.count).sum()
	}
}

impl Model for NGramModel {
	fn start(&self) -> State {
		vec![self.alphabet.serialize(BEG_STRING); self.n - 1]
	}

	/// Walks the trie along `state` extended with `c`, bumping a count at
	/// every depth and allocating child maps as the walk first reaches them.
	fn observe(&mut self, state: &State, c: char) {
		let mut appended = state.clone();
		appended.push(self.alphabet.serialize(c));

		let mut i = 0;
		let last = appended.len() - 1;
		for (j, &sc) in appended.iter().enumerate() {
			let next_free = self.maps.len();
			let entry = self.maps[i].entry(sc).or_insert(Entry { count: 0, next: 0 });
			entry.count += 1;
			if entry.next == 0 && j != last {
				entry.next = next_free;
			}
			i = entry.next;
			if i == next_free {
				self.maps.push(HashMap::new());
			}
		}
	}

	fn step(&self, mut state: State, c: char) -> State {
		state.push(self.alphabet.serialize(c));
		state.remove(0);
		state
	}

	/// Backs off from the longest context to shorter suffixes; the first
	/// context found in the trie yields a smoothed distribution, and when
	/// even the empty context is unseen the result stays uniform.
	fn probs(&mut self, state: &State) -> HashMap<char, f64> {
		let size = self.alphabet.size() as usize;
		let mut probs = vec![1.0 / size as f64; size];

		for i in 0..self.n {
			let mut map = Some(0usize);
			for &sc in &state[i..self.n - 1] {
				map = match map.and_then(|m| self.maps[m].get(&sc)) {
					Some(entry) => Some(entry.next),
					None => None,
				};
				if map.is_none() {
					break;
				}
			}
			if let Some(m) = map {
				let total = Self::map_total(&self.maps[m]) as f64;
				let denominator = total + SMOOTHING * size as f64;
				for (j, p) in probs.iter_mut().enumerate() {
					let count = self.maps[m]
						.get(&(j as u32))
						.map_or(0.0, |entry| entry.count as f64);
					*p = (count + SMOOTHING) / denominator;
				}
				break;
			}
		}

		let mut out = HashMap::with_capacity(size);
		for (i, p) in probs.iter().enumerate() {
			out.insert(self.alphabet.deserialize(i as u32), *p);
		}
		out
	}
}
