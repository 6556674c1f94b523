//! Top-level module for the sequence modeling system.
//!
//! This module provides two next-symbol predictors over a common interface:
//! - An adaptive belief network (`CustomNetModel`) that grows pairwise
//!   combination features selected by mutual information
//! - A fixed-order n-gram baseline (`NGramModel`)
//! - Symbol/index mapping (`Alphabet`)
//! - Generic training, evaluation and generation helpers (`generator`)

use std::collections::HashMap;

/// Bidirectional mapping between characters and dense serial indices,
/// with three reserved sentinel symbols.
pub mod alphabet;

/// The network node arena: shared node state, handles and the
/// backward-belief accumulator contract.
pub mod node;

/// Per-window-position categorical frequency counters (the network's
/// evidence leaves).
///
/// This module is not exposed publicly; its operations are methods on `Node`.
mod input_node;

/// Learned pairwise combination features with 2x2 joint statistics.
///
/// This module is not exposed publicly; its operations are methods on `Node`.
mod combo_node;

/// The adaptive network model: window of input nodes, level-organized
/// combination nodes, forward/backward passes and structure growth.
pub mod network;

/// Fixed-order n-gram model (`n >= 2`) over a flat trie of transition
/// counts, with merging and binary caching.
pub mod ngram_model;

/// Generic training, perplexity and sequence generation over any `Model`.
pub mod generator;

/// Ordered sequence of serial indices forming a model context window.
///
/// A `State` is opaque to callers: it is produced by `start`, advanced by
/// `step` and consumed by `observe`/`probs`. Its length is fixed per model
/// (window length for the network, `n - 1` for the n-gram baseline).
pub type State = Vec<u32>;

/// Common interface implemented by every sequence model.
///
/// The training/evaluation driver is polymorphic over this trait: it calls
/// `observe` and `step` in a loop over training text and queries `probs`
/// for scoring and generation.
///
/// # Notes
/// - `observe` and `probs` both take `&mut self`: observation updates
///   frequency statistics, and a query reuses internal scratch state, so a
///   model instance is a single exclusively-owned resource.
/// - The mapping returned by `probs` covers the entire alphabet, sums to 1
///   and assigns every symbol a strictly positive probability.
pub trait Model {
	/// Returns the initial context (all start-of-text sentinels).
	fn start(&self) -> State;

	/// Updates internal statistics from `state` extended with `c`.
	fn observe(&mut self, state: &State, c: char);

	/// Advances the sliding context: appends `c`, drops the oldest entry.
	fn step(&self, state: State, c: char) -> State;

	/// Returns the distribution over the next symbol given `state`.
	fn probs(&mut self, state: &State) -> HashMap<char, f64>;
}
