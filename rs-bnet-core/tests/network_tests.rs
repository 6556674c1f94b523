//! Integration tests for the adaptive belief network.
//!
//! Small alphabets and short windows are used throughout so structural
//! paths (growth, backward propagation through combination nodes) are
//! exercised with hand-checkable numbers.

use std::collections::HashSet;

use rs_bnet_core::model::alphabet::{Alphabet, BEG_STRING, END_STRING, UNKNOWN};
use rs_bnet_core::model::generator::train;
use rs_bnet_core::model::network::{CustomNetModel, GROWTH_PERIOD};

const EPS: f64 = 1e-9;

/// `{'a', 'b'}` plus the three sentinels: size 5.
fn ab_alphabet() -> Alphabet {
	Alphabet::new(&HashSet::from(['a', 'b']))
}

fn ab_network(window_len: usize) -> CustomNetModel {
	CustomNetModel::new(window_len, ab_alphabet()).unwrap()
}

#[test]
fn alphabet_round_trips_every_training_symbol() {
	let alphabet = ab_alphabet();
	assert_eq!(alphabet.size(), 5);
	for c in ['a', 'b', BEG_STRING, END_STRING, UNKNOWN] {
		assert_eq!(alphabet.deserialize(alphabet.serialize(c)), c);
	}
}

#[test]
fn unmapped_symbols_resolve_to_the_unknown_index() {
	let alphabet = ab_alphabet();
	assert_eq!(alphabet.serialize('z'), alphabet.serialize(UNKNOWN));
	assert_eq!(alphabet.serialize('é'), alphabet.serialize(UNKNOWN));
}

#[test]
fn sentinels_occupy_the_reserved_indices() {
	let alphabet = ab_alphabet();
	assert_eq!(alphabet.serialize(BEG_STRING), 0);
	assert_eq!(alphabet.serialize(END_STRING), 1);
	assert_eq!(alphabet.serialize(UNKNOWN), 2);
}

#[test]
fn zero_length_window_is_rejected() {
	assert!(CustomNetModel::new(0, ab_alphabet()).is_err());
}

#[test]
fn fresh_network_predicts_uniformly() {
	// All counts start equal at 1, so the Laplace floor makes the very
	// first query exactly uniform.
	let mut model = ab_network(2);
	let probs = model.probs(&model.start());
	assert_eq!(probs.len(), 5);
	for &p in probs.values() {
		assert!((p - 0.2).abs() < EPS);
	}
}

#[test]
fn probs_stays_normalized_and_strictly_positive_after_training() {
	let mut model = ab_network(3);
	model.add_combo_node_chars(1, 'a', 2, 'b');
	for s in ["abab", "ba", "aab", "bbba"] {
		train(&mut model, s);
	}

	let mut state = model.start();
	for c in ['a', 'b', 'a'] {
		let probs = model.probs(&state);
		let sum: f64 = probs.values().sum();
		assert!((sum - 1.0).abs() < EPS, "sum {}", sum);
		for (&sym, &p) in &probs {
			assert!(p > 0.0, "symbol {:?} lost its Laplace floor", sym);
		}
		state = model.step(state, c);
	}
}

#[test]
fn observe_counts_only_the_newest_window_position() {
	let mut model = ab_network(2);
	let a = model.alphabet().serialize('a') as usize;
	let target = model.input_node_id(1);
	let (before, before_total) = {
		let (counts, total) = model.node(target).symbol_counts().unwrap();
		(counts.to_vec(), total)
	};

	model.observe(&model.start(), 'a');

	let (after, after_total) = model.node(target).symbol_counts().unwrap();
	assert_eq!(after[a], before[a] + 1);
	assert_eq!(after_total, before_total + 1);
	for i in 0..after.len() {
		if i != a {
			assert_eq!(after[i], before[i]);
		}
	}
}

#[test]
fn self_combination_is_never_possible() {
	let model = ab_network(2);
	let n0 = model.input_node_id(0);
	assert!(!model.combo_possible(n0, 0, n0, 0));
	assert!(!model.combo_possible(n0, 1, n0, 2));
}

#[test]
fn duplicate_combination_is_rejected() {
	let mut model = ab_network(3);
	let n0 = model.input_node_id(0);
	let n1 = model.input_node_id(1);
	assert!(model.combo_possible(n0, 0, n1, 0));
	model.add_combo_node(n0, 0, n1, 0);
	assert!(!model.combo_possible(n0, 0, n1, 0));
	// Other slots between the same nodes stay available.
	assert!(model.combo_possible(n0, 0, n1, 1));
}

#[test]
#[should_panic]
fn adding_a_duplicate_combination_panics() {
	let mut model = ab_network(3);
	let n0 = model.input_node_id(0);
	let n1 = model.input_node_id(1);
	model.add_combo_node(n0, 0, n1, 0);
	model.add_combo_node(n0, 0, n1, 0);
}

#[test]
fn combo_levels_exceed_both_parent_levels() {
	let mut model = ab_network(3);
	let n0 = model.input_node_id(0);
	let n1 = model.input_node_id(1);
	let n2 = model.input_node_id(2);

	let first = model.add_combo_node(n0, 0, n1, 0);
	assert_eq!(model.node(first).level(), 1);

	let second = model.add_combo_node(first, 0, n2, 1);
	assert_eq!(model.node(second).level(), 2);
	assert!(model.node(second).level() > model.node(first).level());
	assert!(model.node(second).level() > model.node(n2).level());
}

#[test]
fn mutual_info_starts_at_independence_and_stays_nonnegative() {
	let mut model = ab_network(2);
	let combo = model.add_combo_node_chars(0, 'a', 1, 'b');
	// Fresh joint table {1,1,1,1} factors into its marginals.
	assert!(model.node(combo).mutual_info().unwrap().abs() < 1e-12);

	for s in ["ab", "ab", "ba", "abab"] {
		train(&mut model, s);
	}
	assert!(model.node(combo).mutual_info().unwrap() >= -1e-12);
}

#[test]
fn end_to_end_ab_scenario() {
	let mut model = ab_network(2);

	let s0 = model.start();
	model.observe(&s0, 'a');
	let s1 = model.step(s0, 'a');
	model.observe(&s1, 'b');
	let s2 = model.step(s1, 'b');

	let probs = model.probs(&s2);
	assert_eq!(probs.len(), 5);
	let sum: f64 = probs.values().sum();
	assert!((sum - 1.0).abs() < EPS);
	for &p in probs.values() {
		assert!(p > 0.0);
	}
	// One "ab" transition was observed, so the plausible continuations
	// outrank symbols that never occurred at the query position.
	assert!(probs[&'a'] > probs[&UNKNOWN]);
	assert!(probs[&'b'] > probs[&UNKNOWN]);
}

#[test]
fn growth_tick_adds_exactly_one_combination() {
	let mut model = ab_network(2);
	let mut state = model.start();

	for i in 0..GROWTH_PERIOD - 1 {
		let c = if i % 2 == 0 { 'a' } else { 'b' };
		model.observe(&state, c);
		state = model.step(state, c);
	}
	assert_eq!(model.n_combos(), 0);

	model.observe(&state, 'b');
	assert_eq!(model.n_combos(), 1);
}

#[test]
fn backward_propagation_boosts_the_correlated_symbol() {
	let mut model = ab_network(2);
	model.add_combo_node_chars(0, 'a', 1, 'b');

	// Alternating text makes "a then b" dominate the joint table.
	let mut state = model.start();
	for _ in 0..200 {
		for c in ['a', 'b'] {
			model.observe(&state, c);
			state = model.step(state, c);
		}
	}

	let query = vec![
		model.alphabet().serialize('b'),
		model.alphabet().serialize('a'),
	];
	let probs = model.probs(&query);
	let sum: f64 = probs.values().sum();
	assert!((sum - 1.0).abs() < EPS);
	assert!(
		probs[&'b'] > probs[&'a'],
		"evidence at the combination node should favor 'b': {:?}",
		probs
	);
}

#[test]
fn repeated_queries_are_stable() {
	// The backward accumulator is scratch space; a second identical query
	// must not drift because of leftover contributions.
	let mut model = ab_network(2);
	model.add_combo_node_chars(0, 'a', 1, 'b');
	for s in ["abab", "ab"] {
		train(&mut model, s);
	}

	let query = model.start();
	let first = model.probs(&query);
	let second = model.probs(&query);
	for (c, p) in &first {
		assert!((p - second[c]).abs() < EPS, "drift at {:?}", c);
	}
}

#[test]
fn open_nodes_are_ranked_by_descending_potential() {
	let mut model = ab_network(2);
	train(&mut model, "abba");
	let open = model.open_nodes();
	assert_eq!(open.len(), 2 * 5);
	for pair in open.windows(2) {
		assert!(pair[0].potential >= pair[1].potential);
	}
}

#[test]
fn diagnostics_render_csv_tables() {
	let mut model = ab_network(2);
	model.add_combo_node_chars(0, 'a', 1, 'b');
	train(&mut model, "abab");

	let mut buf = Vec::new();
	model.describe_inputs(&mut buf).unwrap();
	let text = String::from_utf8(buf).unwrap();
	assert!(text.starts_with("layer,node,char,entropy"));
	// One row per window position and symbol.
	assert_eq!(text.lines().count(), 1 + 2 * 5);

	let mut buf = Vec::new();
	model.describe_combos(&mut buf, 1).unwrap();
	let text = String::from_utf8(buf).unwrap();
	assert!(text.starts_with("layer,node,mutual_info"));
	assert_eq!(text.lines().count(), 2);
	assert!(text.contains("combo1,0,"));
}

#[test]
fn step_slides_the_window() {
	let model = ab_network(3);
	let alphabet = model.alphabet();
	let state = model.step(model.start(), 'a');
	assert_eq!(
		state,
		vec![
			alphabet.serialize(BEG_STRING),
			alphabet.serialize(BEG_STRING),
			alphabet.serialize('a'),
		]
	);
	let state = model.step(state, 'b');
	assert_eq!(
		state,
		vec![
			alphabet.serialize(BEG_STRING),
			alphabet.serialize('a'),
			alphabet.serialize('b'),
		]
	);
}
