use std::iter;

use rand::Rng;

use crate::model::alphabet::{END_STRING, UNKNOWN};
use crate::model::Model;
use crate::progress::Progress;

/// Trains `model` on one example, terminated by the end-of-text sentinel.
pub fn train<M: Model>(model: &mut M, s: &str) {
	let mut state = model.start();
	for c in s.chars().chain(iter::once(END_STRING)) {
		model.observe(&state, c);
		state = model.step(state, c);
	}
}

/// Trains `model` on a whole corpus, rendering a progress bar to stderr.
pub fn train_corpus<M: Model>(model: &mut M, corpus: &[String]) {
	let mut pbar = Progress::new(corpus.len());
	for s in corpus {
		train(model, s);
		pbar.add(1);
	}
}

/// Per-symbol perplexity of `model` on one example, `2^(-mean log2 p)`.
///
/// Symbols outside the model's alphabet are scored through the unknown
/// sentinel's probability, so the result is always finite.
pub fn perplexity<M: Model>(model: &mut M, s: &str) -> f64 {
	let mut logprob = 0.0;
	let mut len = 0usize;
	let mut state = model.start();
	for c in s.chars().chain(iter::once(END_STRING)) {
		let probs = model.probs(&state);
		let prob = match probs.get(&c) {
			Some(p) => *p,
			None => probs[&UNKNOWN],
		};
		logprob -= prob.log2();
		len += 1;
		state = model.step(state, c);
	}
	(logprob / len as f64).exp2()
}

/// Geometric mean of per-example perplexities over a corpus, with progress.
pub fn corpus_perplexity<M: Model>(model: &mut M, corpus: &[String]) -> f64 {
	let mut pbar = Progress::new(corpus.len());
	let mut avg = 0.0;
	for s in corpus {
		avg += perplexity(model, s).log2();
		pbar.add(1);
	}
	(avg / corpus.len() as f64).exp2()
}

/// Greedy argmax decoding: repeatedly emits the most probable next symbol
/// until the end-of-text sentinel or `max_len` symbols.
pub fn generate_best<M: Model>(model: &mut M, max_len: usize) -> String {
	let mut out = String::new();
	let mut state = model.start();
	for _ in 0..max_len {
		let probs = model.probs(&state);
		// Should not panic, probs covers the whole alphabet
		let (&c, _) = probs.iter().max_by(|a, b| a.1.total_cmp(b.1)).unwrap();
		if c == END_STRING {
			break;
		}
		out.push(c);
		state = model.step(state, c);
	}
	out
}

/// Samples a sequence from the model's next-symbol distributions.
///
/// Each step draws from `probs` by cumulative weight, so symbols appear in
/// proportion to their predicted probability.
pub fn generate_random<M: Model>(model: &mut M, max_len: usize) -> String {
	let mut rng = rand::rng();
	let mut out = String::new();
	let mut state = model.start();
	for _ in 0..max_len {
		let probs = model.probs(&state);
		let mut r: f64 = rng.random();
		let mut picked = None;
		for (&c, &p) in &probs {
			picked = Some(c);
			r -= p;
			if r <= 0.0 {
				break;
			}
		}
		// Fallback end: the distribution sums to 1, so the loop breaks early
		// for every draw except rounding at the very top of the range.
		let Some(c) = picked else { break };
		if c == END_STRING {
			break;
		}
		out.push(c);
		state = model.step(state, c);
	}
	out
}
