use crate::model::combo_node::ComboData;
use crate::model::input_node::InputData;

/// Stable handle into the network's node arena.
///
/// Nodes reference each other through handles, never through direct
/// references, so the arena can grow while combination nodes hold on to
/// their parents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) usize);

/// Kind-specific node payload.
///
/// The set of node kinds is closed: traversal routines dispatch on this
/// variant instead of virtual calls.
pub(crate) enum NodeKind {
	Input(InputData),
	Combo(ComboData),
}

/// A computational unit of the belief network.
///
/// Every node carries the state shared by all kinds:
/// - `level`: topological depth, 0 for the input leaves
/// - `forward_bits`: the most recently observed/forwarded evidence bits
/// - `backward_log_ps` / `backward_counts`: the backward-belief accumulator,
///   one slot per output, holding log-probability contributions and how many
///   contributions each slot received
///
/// The accumulator is scratch space for a single inference pass: it is
/// cleared between queries and mutated destructively during `probs`.
pub struct Node {
	level: usize,
	pub(crate) forward_bits: Vec<bool>,
	pub(crate) backward_log_ps: Vec<f64>,
	pub(crate) backward_counts: Vec<usize>,
	pub(crate) kind: NodeKind,
}

impl Node {
	pub(crate) fn new(level: usize, n_forward_bits: usize, n_outputs: usize, kind: NodeKind) -> Self {
		Self {
			level,
			forward_bits: vec![false; n_forward_bits],
			backward_log_ps: vec![0.0; n_outputs],
			backward_counts: vec![0; n_outputs],
			kind,
		}
	}

	/// Topological depth of this node; input leaves are at level 0.
	pub fn level(&self) -> usize {
		self.level
	}

	/// Current forward bit at `index`.
	pub fn forward_bit(&self, index: usize) -> bool {
		self.forward_bits[index]
	}

	/// Number of inputs this node reads during its forward pass.
	pub fn n_inputs(&self) -> usize {
		match &self.kind {
			NodeKind::Input(_) => 0,
			NodeKind::Combo(_) => 2,
		}
	}

	/// Number of backward-accumulator slots.
	pub fn n_outputs(&self) -> usize {
		self.backward_log_ps.len()
	}

	/// Adds a log-likelihood contribution toward output `index` and counts it.
	///
	/// Downstream nodes call this during the backward pass to push belief
	/// toward an ancestor.
	pub(crate) fn contribute_backward_loglh(&mut self, index: usize, loglh: f64) {
		self.backward_log_ps[index] += loglh;
		self.backward_counts[index] += 1;
	}

	/// Running average log-probability accumulated for output `index`.
	pub fn backward_logprob(&self, index: usize) -> f64 {
		self.backward_log_ps[index] - (self.backward_counts[index] as f64).log2()
	}

	/// Resets the backward accumulator to the neutral state.
	pub(crate) fn clear_backward(&mut self) {
		self.backward_log_ps.fill(0.0);
		self.backward_counts.fill(0);
	}

	/// The raw accumulated backward log-distribution.
	pub fn logprobs(&self) -> &[f64] {
		&self.backward_log_ps
	}

	/// Exponentiates and renormalizes the backward log-distribution into a
	/// proper probability distribution over this node's outputs.
	///
	/// Only meaningful after a backward pass has normalized the slots; used
	/// on the query position's input node to read out the posterior.
	pub fn probs(&self) -> Vec<f64> {
		let mut ps: Vec<f64> = self.backward_log_ps.iter().map(|lp| lp.exp2()).collect();
		let total: f64 = ps.iter().sum();
		for p in &mut ps {
			*p /= total;
		}
		ps
	}

	/// Per-output Shannon entropy in bits.
	///
	/// For input nodes this is the per-symbol Bernoulli entropy used as the
	/// leaf structure-growth signal; for combination nodes, the per-cell
	/// Bernoulli entropy of the joint table.
	pub fn entropy(&self) -> Vec<f64> {
		match &self.kind {
			NodeKind::Input(input) => input.entropy(),
			NodeKind::Combo(combo) => combo.entropy(),
		}
	}

	/// The scalar ranking signal used to select combination candidates:
	/// entropy for input nodes, mutual information for combination nodes.
	pub fn potential(&self) -> Vec<f64> {
		match &self.kind {
			NodeKind::Input(input) => input.entropy(),
			NodeKind::Combo(combo) => vec![combo.mutual_info(); self.n_outputs()],
		}
	}

	/// Mutual information between the two parent bits, for combination
	/// nodes; `None` for input nodes.
	pub fn mutual_info(&self) -> Option<f64> {
		match &self.kind {
			NodeKind::Input(_) => None,
			NodeKind::Combo(combo) => Some(combo.mutual_info()),
		}
	}

	/// Per-symbol occurrence counts and total, for input nodes; `None` for
	/// combination nodes.
	pub fn symbol_counts(&self) -> Option<(&[usize], usize)> {
		match &self.kind {
			NodeKind::Input(input) => Some((input.counts.as_slice(), input.total)),
			NodeKind::Combo(_) => None,
		}
	}
}

/// `log2(2^v1 + 2^v2)` without leaving the log domain.
///
/// The larger operand is factored out so the sum never underflows, which
/// keeps long chains of small probabilities finite.
pub(crate) fn log_add_exp(v1: f64, v2: f64) -> f64 {
	let (hi, lo) = if v1 >= v2 { (v1, v2) } else { (v2, v1) };
	if hi == f64::NEG_INFINITY {
		return f64::NEG_INFINITY;
	}
	hi + (1.0 + (lo - hi).exp2()).log2()
}
