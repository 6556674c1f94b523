//! Adaptive belief-network character modeling library.
//!
//! This crate provides an online character-level sequence modeling system including:
//! - A dynamically grown belief network over a sliding symbol window
//! - A fixed-order suffix-trie n-gram baseline
//! - Probabilistic generation and perplexity evaluation helpers
//! - Internal utilities for corpus I/O and progress reporting
//!
//! Both models share the same observe/step/probs interface so that training
//! and evaluation drivers can be written once, generic over the model.

/// Core sequence models, the shared model interface and generation logic.
///
/// This module exposes the high-level model types while keeping
/// node-internal representations private.
pub mod model;

/// I/O utilities (corpus loading, cache path helpers).
pub mod io;

/// Textual progress indicator rendered to stderr.
pub mod progress;
