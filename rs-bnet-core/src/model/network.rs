use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use crate::model::alphabet::{Alphabet, BEG_STRING};
use crate::model::node::{Node, NodeId, NodeKind};
use crate::model::{Model, State};

/// Every `GROWTH_PERIOD`-th observation triggers a structure-growth scan.
pub const GROWTH_PERIOD: usize = 1000;

/// Number of combination nodes added per growth scan.
pub const GROWTH_ADDITIONS_PER_TICK: usize = 1;

/// A single rankable output slot on some node, eligible for combination.
pub struct OpenNode {
	pub node: NodeId,
	pub index: usize,
	pub potential: f64,
}

/// Identifying key of an ordered parent pair that has already been combined.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct ComboSlot {
	node1: NodeId,
	node2: NodeId,
	index1: usize,
	index2: usize,
}

/// Adaptive belief-network model over a sliding symbol window.
///
/// The network owns a fixed window of input leaves (one categorical counter
/// per position) and a dynamically growing, level-organized collection of
/// pairwise combination nodes. Training (`observe`) updates frequency
/// statistics and periodically grows the structure; a query (`probs`) runs
/// a forward pass over the known context and a reverse-level-order backward
/// pass that propagates belief into the query position.
///
/// # Invariants
/// - Input leaves occupy arena handles `0..window_len` and are level 0
/// - A combination node's level is strictly greater than both parents'
/// - Combination nodes are never removed; the slot set only grows
/// - All counts start at 1 or above, so every queried distribution is
///   strictly positive everywhere
pub struct CustomNetModel {
	alphabet: Alphabet,
	nodes: Vec<Node>,
	window_len: usize,
	/// Combination-node handles grouped by level, grown on demand.
	/// `levels[0]` belongs to the input leaves and stays empty.
	levels: Vec<Vec<NodeId>>,
	combo_slots: HashSet<ComboSlot>,
	n_observed: usize,
}

impl CustomNetModel {
	/// Creates a network with `window_len` input positions over `alphabet`.
	///
	/// # Errors
	/// Returns an error if `window_len` is zero.
	pub fn new(window_len: usize, alphabet: Alphabet) -> Result<Self, String> {
		if window_len == 0 {
			return Err("window length must be >= 1".to_owned());
		}
		let nodes = (0..window_len)
			.map(|_| Node::new_input(alphabet.size() as usize))
			.collect();
		Ok(Self {
			alphabet,
			nodes,
			window_len,
			levels: vec![Vec::new()],
			combo_slots: HashSet::new(),
			n_observed: 0,
		})
	}

	/// Number of window positions.
	pub fn window_len(&self) -> usize {
		self.window_len
	}

	/// The alphabet this network was built over.
	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	/// Handle of the input leaf at window position `index`.
	///
	/// # Panics
	/// Panics if `index` is outside the window.
	pub fn input_node_id(&self, index: usize) -> NodeId {
		assert!(index < self.window_len, "window position out of range");
		NodeId(index)
	}

	/// Read access to a node in the arena.
	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	/// Number of combination nodes grown so far.
	pub fn n_combos(&self) -> usize {
		self.nodes.len() - self.window_len
	}

	/// Whether `(node1, index1)` and `(node2, index2)` may be combined:
	/// the nodes must be distinct and the ordered slot unused.
	pub fn combo_possible(&self, node1: NodeId, index1: usize, node2: NodeId, index2: usize) -> bool {
		node1 != node2
			&& !self.combo_slots.contains(&ComboSlot { node1, node2, index1, index2 })
	}

	/// `combo_possible` addressed by window position and symbol, for manual
	/// seeding by a driver.
	pub fn combo_possible_chars(&self, pos1: usize, c1: char, pos2: usize, c2: char) -> bool {
		self.combo_possible(
			self.input_node_id(pos1),
			self.alphabet.serialize(c1) as usize,
			self.input_node_id(pos2),
			self.alphabet.serialize(c2) as usize,
		)
	}

	/// Adds a combination node over the given parent output bits.
	///
	/// The new node's level is one deeper than the deepest parent, and it is
	/// appended to that level's list, so ascending-level traversal remains a
	/// valid topological order.
	///
	/// # Panics
	/// Panics if the combination is not legal (`combo_possible` is false):
	/// self-combinations and duplicate slots are programmer errors.
	pub fn add_combo_node(
		&mut self,
		node1: NodeId,
		index1: usize,
		node2: NodeId,
		index2: usize,
	) -> NodeId {
		assert!(
			self.combo_possible(node1, index1, node2, index2),
			"illegal combination: identical parents or slot already combined"
		);
		let level = self.nodes[node1.0].level().max(self.nodes[node2.0].level()) + 1;
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node::new_combo(level, node1, index1, node2, index2));
		while self.levels.len() <= level {
			self.levels.push(Vec::new());
		}
		self.levels[level].push(id);
		self.combo_slots.insert(ComboSlot { node1, node2, index1, index2 });
		id
	}

	/// `add_combo_node` addressed by window position and symbol.
	pub fn add_combo_node_chars(&mut self, pos1: usize, c1: char, pos2: usize, c2: char) -> NodeId {
		let node1 = self.input_node_id(pos1);
		let node2 = self.input_node_id(pos2);
		let index1 = self.alphabet.serialize(c1) as usize;
		let index2 = self.alphabet.serialize(c2) as usize;
		self.add_combo_node(node1, index1, node2, index2)
	}

	/// All open positions, ranked by descending potential.
	///
	/// Input leaves expose one open position per symbol (ranked by
	/// per-symbol entropy); combination nodes expose their single forward
	/// output (ranked by mutual information). Ties carry no meaning.
	pub fn open_nodes(&self) -> Vec<OpenNode> {
		let mut out = Vec::new();
		for (i, node) in self.nodes.iter().enumerate() {
			match &node.kind {
				NodeKind::Input(_) => {
					for (index, potential) in node.potential().into_iter().enumerate() {
						out.push(OpenNode { node: NodeId(i), index, potential });
					}
				}
				NodeKind::Combo(_) => {
					out.push(OpenNode {
						node: NodeId(i),
						index: 0,
						potential: node.potential()[0],
					});
				}
			}
		}
		out.sort_by(|a, b| b.potential.total_cmp(&a.potential));
		out
	}

	/// Returns the initial context: the whole window set to start-of-text.
	pub fn start(&self) -> State {
		vec![self.alphabet.serialize(BEG_STRING); self.window_len]
	}

	/// Trains the network on `state` extended with `c`.
	///
	/// The trained window is the `window_len` most recent symbols including
	/// `c` itself, so the newest position counts the newly observed symbol.
	/// Inputs observe and forward first, then every combination level in
	/// ascending order (parents always sit at strictly lower levels, so each
	/// node reads forward bits already set this round).
	pub fn observe(&mut self, state: &State, c: char) {
		debug_assert_eq!(state.len(), self.window_len);
		let serial = self.alphabet.serialize(c);

		for i in 0..self.window_len {
			let word = if i + 1 < self.window_len { state[i + 1] } else { serial };
			let input = &mut self.nodes[i];
			input.set_word(word);
			input.input_observe();
			input.input_forward();
		}

		for level in 1..self.levels.len() {
			for k in 0..self.levels[level].len() {
				let id = self.levels[level][k];
				let (bit1, bit2) = self.parent_bits(id);
				let combo = &mut self.nodes[id.0];
				combo.combo_observe(bit1, bit2);
				combo.combo_forward(bit1, bit2);
			}
		}

		self.n_observed += 1;
		if self.n_observed % GROWTH_PERIOD == 0 {
			self.grow();
		}
	}

	/// Advances the sliding window: appends `c`, drops the oldest symbol.
	pub fn step(&self, mut state: State, c: char) -> State {
		state.push(self.alphabet.serialize(c));
		state.remove(0);
		state
	}

	/// Distribution over the next symbol given `state`.
	///
	/// The last window position is the sole inference target. Every other
	/// input is set from the context and forwarded; a combination node
	/// referencing the target (directly or transitively) is marked unknown
	/// and backward-cleared instead of forwarded. Belief then propagates in
	/// descending level order through the unknown nodes and finally into the
	/// target input, whose normalized posterior is returned in symbol space.
	pub fn probs(&mut self, state: &State) -> HashMap<char, f64> {
		debug_assert_eq!(state.len(), self.window_len);
		let target = NodeId(self.window_len - 1);
		let mut unknown: HashSet<NodeId> = HashSet::from([target]);

		// forward pass
		for i in 0..self.window_len - 1 {
			let input = &mut self.nodes[i];
			input.set_word(state[i + 1]);
			input.input_forward();
		}
		for level in 1..self.levels.len() {
			for k in 0..self.levels[level].len() {
				let id = self.levels[level][k];
				let (node1, _, node2, _) = self.nodes[id.0].combo_parents();
				if unknown.contains(&node1) || unknown.contains(&node2) {
					unknown.insert(id);
					self.nodes[id.0].clear_backward();
				} else {
					let (bit1, bit2) = self.parent_bits(id);
					self.nodes[id.0].combo_forward(bit1, bit2);
				}
			}
		}

		// backward pass
		self.nodes[target.0].clear_backward();
		for level in (1..self.levels.len()).rev() {
			for k in 0..self.levels[level].len() {
				let id = self.levels[level][k];
				if unknown.contains(&id) {
					self.backward_combo(id, &unknown);
				}
			}
		}
		self.nodes[target.0].input_backward();

		// deserialize
		let serial_ps = self.nodes[target.0].probs();
		let mut out = HashMap::with_capacity(serial_ps.len());
		for (i, p) in serial_ps.iter().enumerate() {
			out.insert(self.alphabet.deserialize(i as u32), *p);
		}
		out
	}

	/// Renders the per-position/per-symbol entropy table as CSV.
	pub fn describe_inputs<W: Write>(&self, out: &mut W) -> io::Result<()> {
		writeln!(out, "layer,node,char,entropy")?;
		for i in 0..self.window_len {
			let entropy = self.nodes[i].entropy();
			for (sc, e) in entropy.iter().enumerate() {
				writeln!(out, "input,{},{},{}", i, self.alphabet.deserialize(sc as u32), e)?;
			}
		}
		Ok(())
	}

	/// Renders the mutual-information table of one combination level as CSV.
	///
	/// # Panics
	/// Panics if no combination node has reached `level` yet.
	pub fn describe_combos<W: Write>(&self, out: &mut W, level: usize) -> io::Result<()> {
		writeln!(out, "layer,node,mutual_info")?;
		for (k, id) in self.levels[level].iter().enumerate() {
			// Should not panic, level lists hold combination nodes only
			let info = self.nodes[id.0].mutual_info().unwrap();
			writeln!(out, "combo{},{},{}", level, k, info)?;
		}
		Ok(())
	}

	/// Current forward bits of a combination node's two parents.
	fn parent_bits(&self, id: NodeId) -> (bool, bool) {
		let (node1, index1, node2, index2) = self.nodes[id.0].combo_parents();
		(
			self.nodes[node1.0].forward_bit(index1),
			self.nodes[node2.0].forward_bit(index2),
		)
	}

	/// One backward step at a combination node.
	///
	/// Belief flows only from a known side to an unknown side, and only on
	/// positive joint evidence; the resulting log-likelihood lands on the
	/// unknown parent at the output index this combination watches there.
	fn backward_combo(&mut self, id: NodeId, unknown: &HashSet<NodeId>) {
		let (node1, index1, node2, index2) = self.nodes[id.0].combo_parents();
		let known1 = !unknown.contains(&node1);
		let known2 = !unknown.contains(&node2);
		if known1 == known2 {
			return;
		}
		let bit1 = self.nodes[node1.0].forward_bit(index1);
		let bit2 = self.nodes[node2.0].forward_bit(index2);
		if !bit1 && !bit2 {
			return;
		}
		let loglh = self.nodes[id.0].combo_backward(bit1, bit2, known1);
		let (receiver, index) = if known1 { (node2, index2) } else { (node1, index1) };
		self.nodes[receiver.0].contribute_backward_loglh(index, loglh);
	}

	/// Structure growth: combines the highest-potential open pair.
	///
	/// All open positions are ranked by descending potential; the scan adds
	/// a combination node for the first legal ordered pair and stops after
	/// `GROWTH_ADDITIONS_PER_TICK` additions.
	fn grow(&mut self) {
		let open = self.open_nodes();
		let mut added = 0;
		'scan: for first in &open {
			for second in &open {
				if self.combo_possible(first.node, first.index, second.node, second.index) {
					self.add_combo_node(first.node, first.index, second.node, second.index);
					added += 1;
					if added >= GROWTH_ADDITIONS_PER_TICK {
						break 'scan;
					}
				}
			}
		}
	}
}

impl Model for CustomNetModel {
	fn start(&self) -> State {
		CustomNetModel::start(self)
	}

	fn observe(&mut self, state: &State, c: char) {
		CustomNetModel::observe(self, state, c);
	}

	fn step(&self, state: State, c: char) -> State {
		CustomNetModel::step(self, state, c)
	}

	fn probs(&mut self, state: &State) -> HashMap<char, f64> {
		CustomNetModel::probs(self, state)
	}
}
