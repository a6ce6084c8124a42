//! Prune engine (§4.6).
//!
//! The mirror image of [`crate::growth`]: every edge and node is scored on
//! how weak, unused, or stale it has become, and those independent factors
//! multiply into a single probability roll — not a noisy-OR over "survives
//! any one check", but the literal joint probability of failing all three
//! at once.

use crate::config::ControlParams;
use crate::edge::Edge;
use crate::graph::GraphStore;
use crate::node::Node;
use crate::rng::Rng;

/// Reference `w_eff` below which an edge counts as weak.
const PRUNE_WEIGHT_REF: f64 = 2.0;
/// Reference use-count below which an edge counts as unused.
const USE_COUNT_REF: f64 = 10.0;
/// Reference `stale_ticks` beyond which an edge counts as stale.
const STALE_REF: f64 = 200.0;
/// Reference node staleness (ticks since last strong activation) beyond
/// which an isolated node counts as stale.
const NODE_STALE_REF: f64 = 1000.0;

/// Outcome of one prune pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct PruneOutcome {
	/// Edges removed this tick.
	pub edges_pruned: u32,
	/// Nodes removed this tick.
	pub nodes_pruned: u32,
}

#[inline]
fn sigmoid(x: f64) -> f64 {
	1.0 / (1.0 + (-x).exp())
}

/// Per-tick deletion probability for a single edge: `prune_rate · p_weak ·
/// p_unused · p_stale`, each factor a continuous sigmoid around its
/// reference constant.
#[must_use]
pub fn edge_prune_probability(edge: &Edge, prune_rate: f64) -> f64 {
	let p_weak = sigmoid(-(edge.w_eff() - PRUNE_WEIGHT_REF));
	let p_unused = sigmoid(-(f64::from(edge.use_count) - USE_COUNT_REF));
	let p_stale = sigmoid(f64::from(edge.stale_ticks) - STALE_REF);
	prune_rate * p_weak * p_unused * p_stale
}

/// Per-tick deletion probability for a single node: `2·prune_rate ·
/// p_isolated · p_stale`, where `p_isolated` is a hard 0/1 gate (the node
/// has no edges at all) and `p_stale` is continuous in ticks since its
/// last strong activation.
#[must_use]
pub fn node_prune_probability(node: &Node, tick: u64, prune_rate: f64) -> f64 {
	let p_isolated = if node.in_deg == 0 && node.out_deg == 0 { 1.0 } else { 0.0 };
	let staleness = tick.saturating_sub(node.last_tick_seen);
	let p_stale = sigmoid(staleness as f64 - NODE_STALE_REF);
	2.0 * prune_rate * p_isolated * p_stale
}

/// Run the prune engine over every live edge, then every live node.
pub fn prune(graph: &mut GraphStore, tick: u64, params: &ControlParams, rng: &mut Rng) -> PruneOutcome {
	let mut outcome = PruneOutcome::default();

	for edge_id in graph.live_edge_ids() {
		let Some(edge) = graph.edge(edge_id) else {
			continue;
		};
		let p_prune = edge_prune_probability(edge, params.prune_rate);
		if rng.chance(p_prune) {
			graph.delete_edge(edge_id);
			outcome.edges_pruned += 1;
		}
	}

	for node_id in graph.live_node_ids() {
		let Some(node) = graph.node(node_id) else {
			continue;
		};
		let p_prune = node_prune_probability(node, tick, params.prune_rate);
		if rng.chance(p_prune) {
			graph.delete_node(node_id);
			outcome.nodes_pruned += 1;
		}
	}

	outcome
}
