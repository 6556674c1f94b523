use crate::model::node::{log_add_exp, Node, NodeKind};

/// Payload of a window-position input node.
///
/// An input node is a categorical frequency counter over the alphabet and
/// forms one of the network's evidence leaves. Counts start at 1 for every
/// symbol (Laplace smoothing) so no symbol ever has zero probability.
pub(crate) struct InputData {
	/// Serial index currently set for this window position.
	pub(crate) word: u32,
	/// Per-symbol occurrence counts, initialized to 1.
	pub(crate) counts: Vec<usize>,
	/// Total observation count, initialized to 2.
	pub(crate) total: usize,
}

impl InputData {
	/// Per-symbol Bernoulli entropy, `-p*log2(p) - (1-p)*log2(1-p)` with
	/// `p = counts[i]/total`.
	///
	/// Each symbol is treated as an independent occurred/did-not-occur
	/// event. This is a relative ranking signal for structure growth, not
	/// the categorical entropy of the distribution, and the growth ordering
	/// depends on it staying that way.
	pub(crate) fn entropy(&self) -> Vec<f64> {
		let mut out = Vec::with_capacity(self.counts.len());
		for &count in &self.counts {
			let p = count as f64 / self.total as f64;
			out.push(-p * p.log2() - (1.0 - p) * (1.0 - p).log2());
		}
		out
	}
}

impl Node {
	/// Creates an input leaf over an alphabet of `n_words` symbols.
	pub(crate) fn new_input(n_words: usize) -> Self {
		Node::new(
			0,
			n_words,
			n_words,
			NodeKind::Input(InputData {
				word: 0,
				counts: vec![1; n_words],
				total: 2,
			}),
		)
	}

	/// Sets the symbol this window position currently holds.
	pub(crate) fn set_word(&mut self, word: u32) {
		let NodeKind::Input(input) = &mut self.kind else {
			unreachable!("set_word on a non-input node");
		};
		input.word = word;
	}

	/// Counts the currently set symbol.
	pub(crate) fn input_observe(&mut self) {
		let NodeKind::Input(input) = &mut self.kind else {
			unreachable!("input_observe on a non-input node");
		};
		input.counts[input.word as usize] += 1;
		input.total += 1;
	}

	/// Recomputes the one-hot forward bit vector for the set symbol.
	pub(crate) fn input_forward(&mut self) {
		let Node { forward_bits, kind, .. } = self;
		let NodeKind::Input(input) = kind else {
			unreachable!("input_forward on a non-input node");
		};
		forward_bits.fill(false);
		forward_bits[input.word as usize] = true;
	}

	/// Folds the smoothed frequency prior into the backward accumulator and
	/// normalizes it into a valid log-distribution.
	///
	/// Slots that received external contributions keep them (the prior is
	/// added on top); untouched slots are set to the prior alone. The
	/// log-sum-exp normalization guarantees the slots sum to 1 in
	/// probability space.
	pub(crate) fn input_backward(&mut self) {
		let Node { backward_log_ps, backward_counts, kind, .. } = self;
		let NodeKind::Input(input) = kind else {
			unreachable!("input_backward on a non-input node");
		};

		let log_total = (input.total as f64).log2();
		let mut log_mass = f64::NEG_INFINITY;
		for i in 0..backward_log_ps.len() {
			let log_freq = (input.counts[i] as f64).log2() - log_total;
			if backward_counts[i] > 0 {
				backward_log_ps[i] += log_freq;
			} else {
				backward_log_ps[i] = log_freq;
			}
			log_mass = log_add_exp(log_mass, backward_log_ps[i]);
		}
		for log_p in backward_log_ps.iter_mut() {
			*log_p -= log_mass;
		}
	}
}
