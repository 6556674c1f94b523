use crate::model::node::{log_add_exp, Node, NodeId, NodeKind};

/// Cell index into the 2x2 joint table for a pair of parent bits.
pub(crate) fn xs_index(bit1: bool, bit2: bool) -> usize {
	(bit1 as usize) | ((bit2 as usize) << 1)
}

/// Payload of a learned pairwise combination node.
///
/// A combination node watches one output bit on each of two existing nodes
/// and maintains a 2x2 joint contingency table of their co-occurrence.
/// Cells start at 1 and the total at 4, so every joint configuration keeps
/// strictly positive probability.
pub(crate) struct ComboData {
	pub(crate) node1: NodeId,
	pub(crate) node2: NodeId,
	pub(crate) index1: usize,
	pub(crate) index2: usize,
	/// Joint counts indexed by `xs_index(bit1, bit2)`.
	counts: [usize; 4],
	total: usize,
}

impl ComboData {
	/// Mutual information between the two watched bits, in bits.
	///
	/// Standard discrete mutual information over the joint table, with the
	/// marginals derived from row/column sums. Non-negative; zero exactly
	/// when the joint counts factor into their marginals.
	pub(crate) fn mutual_info(&self) -> f64 {
		let mut info = 0.0;
		let log_n = (self.total as f64).log2();
		for bit1 in [true, false] {
			let row = self.counts[xs_index(bit1, true)] + self.counts[xs_index(bit1, false)];
			let log_p1 = (row as f64).log2() - log_n;
			for bit2 in [true, false] {
				let col = self.counts[xs_index(true, bit2)] + self.counts[xs_index(false, bit2)];
				let log_p2 = (col as f64).log2() - log_n;
				let count = self.counts[xs_index(bit1, bit2)];
				let prob_joint = count as f64 / self.total as f64;
				let log_p_joint = (count as f64).log2() - log_n;
				info += prob_joint * (log_p_joint - (log_p1 + log_p2));
			}
		}
		info
	}

	/// Per-cell Bernoulli entropy of the joint table.
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
	/// Creates a combination node over two parent output bits.
	///
	/// The level is one deeper than the deepest parent; the network computes
	/// it from the arena and guarantees the parents are distinct.
	pub(crate) fn new_combo(
		level: usize,
		node1: NodeId,
		index1: usize,
		node2: NodeId,
		index2: usize,
	) -> Self {
		Node::new(
			level,
			2,
			4,
			NodeKind::Combo(ComboData {
				node1,
				node2,
				index1,
				index2,
				counts: [1, 1, 1, 1],
				total: 4,
			}),
		)
	}

	/// Parent handles and the watched output index on each.
	pub(crate) fn combo_parents(&self) -> (NodeId, usize, NodeId, usize) {
		let NodeKind::Combo(combo) = &self.kind else {
			unreachable!("combo_parents on a non-combo node");
		};
		(combo.node1, combo.index1, combo.node2, combo.index2)
	}

	/// Counts the current joint configuration of the parent bits.
	pub(crate) fn combo_observe(&mut self, bit1: bool, bit2: bool) {
		let NodeKind::Combo(combo) = &mut self.kind else {
			unreachable!("combo_observe on a non-combo node");
		};
		combo.counts[xs_index(bit1, bit2)] += 1;
		combo.total += 1;
	}

	/// Recomputes the node's own forward bit: the AND of the parent bits.
	pub(crate) fn combo_forward(&mut self, bit1: bool, bit2: bool) {
		let NodeKind::Combo(_) = &self.kind else {
			unreachable!("combo_forward on a non-combo node");
		};
		self.forward_bits[0] = bit1 && bit2;
	}

	/// Belief-propagation step toward the unknown parent.
	///
	/// The caller has already established that exactly one parent is
	/// unknown (`known1` tells which side is known) and that at least one
	/// parent bit is set. Folds the log-empirical frequency of each joint
	/// cell into the backward accumulator (keeping accumulated external
	/// contributions), normalizes via log-sum-exp, then conditions on the
	/// known side's observed bit: the returned scalar is the
	/// log-likelihood-ratio `logp - logBaseRate`, where `logp` is the
	/// conditional log-probability of the known bit given the unknown side
	/// being true, and `logBaseRate` the known bit's base rate. The network
	/// contributes it to the unknown parent's accumulator.
	pub(crate) fn combo_backward(&mut self, bit1: bool, bit2: bool, known1: bool) -> f64 {
		let Node { backward_log_ps, backward_counts, kind, .. } = self;
		let NodeKind::Combo(combo) = kind else {
			unreachable!("combo_backward on a non-combo node");
		};

		let log_total = (combo.total as f64).log2();
		let mut log_mass = f64::NEG_INFINITY;
		for i in 0..4 {
			let log_freq = (combo.counts[i] as f64).log2() - log_total;
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

		let (true_log_p, false_log_p) = if known1 {
			(
				backward_log_ps[xs_index(bit1, true)],
				backward_log_ps[xs_index(bit1, false)],
			)
		} else {
			(
				backward_log_ps[xs_index(true, bit2)],
				backward_log_ps[xs_index(false, bit2)],
			)
		};
		let log_p = true_log_p - log_add_exp(true_log_p, false_log_p);
		let log_base_rate = log_add_exp(true_log_p, false_log_p);
		log_p - log_base_rate
	}
}
