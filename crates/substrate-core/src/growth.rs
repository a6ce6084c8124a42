//! Growth engine (§4.5).
//!
//! Two independent processes, each gated by its own per-tick probability
//! roll so neither runs unconditionally every tick:
//! - Co-activity growth fires on roughly a tenth of ticks and, for matching
//!   co-active pairs, spawns a new hidden node wired from both of them
//!   rather than wiring the pair directly — a hub, not a shortcut.
//! - Layer meta-node emergence fires with a probability that itself scales
//!   with `energy`, and looks at each node's own outgoing-edge density
//!   rather than any graph-wide fraction.
//! Every creation decision downstream of those gates is still a single
//! probability roll shaped continuously, never a hard cutoff.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::config::ControlParams;
use crate::graph::GraphStore;
use crate::node::NodeId;
use crate::rng::Rng;

/// Upper bound on how many live nodes are considered as co-activity growth
/// candidates in a single tick, to keep the pairwise scan bounded
/// regardless of how large the graph gets.
const MAX_GROWTH_CANDIDATES: usize = 64;

/// Fraction of ticks on which the co-activity growth process rolls at all.
const CO_ACTIVITY_GATE_PROB: f64 = 0.1;

/// Reference co-occurrence count novelty is scaled against.
const CO_FREQ_REF: f64 = 10.0;

/// Target outgoing-activation density a node needs to be layer-emergence
/// eligible.
const DENSITY_REF: f64 = 0.6;

/// Minimum out-degree a node needs before layer emergence becomes likely.
const LAYER_MIN_SIZE: f64 = 10.0;

/// Outcome of one growth pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrowthOutcome {
	/// Edges created this tick (hub-formation edges from co-activity
	/// growth; the meta-node's own connecting edge is not counted here).
	pub edges_created: u32,
	/// Meta-nodes created this tick.
	pub meta_nodes_created: u32,
}

#[inline]
fn sigmoid(x: f64) -> f64 {
	1.0 / (1.0 + (-x).exp())
}

/// Run the growth engine: a gated co-activity hub-formation pass, then a
/// gated layer-meta-node emergence pass.
pub fn grow(graph: &mut GraphStore, energy: f64, params: &ControlParams, rng: &mut Rng) -> GrowthOutcome {
	let mut outcome = GrowthOutcome::default();

	if rng.chance(CO_ACTIVITY_GATE_PROB) {
		grow_from_co_activity(graph, energy, params, rng, &mut outcome);
	}

	if rng.chance(params.layer_rate * 0.5f64.mul_add(energy, 1.0)) {
		grow_layer_meta_node(graph, params, rng, &mut outcome);
	}

	outcome
}

/// For co-active pairs `(i, j)` with `i < j`, spawn a hidden node `k` wired
/// as `(i, k)` and `(j, k)` with a probability shaped by how novel and
/// similar their recent firing signatures are.
fn grow_from_co_activity(graph: &mut GraphStore, energy: f64, params: &ControlParams, rng: &mut Rng, outcome: &mut GrowthOutcome) {
	let candidates: SmallVec<[NodeId; MAX_GROWTH_CANDIDATES]> = graph.live_node_ids().take(MAX_GROWTH_CANDIDATES).collect();

	for i in 0..candidates.len() {
		for j in (i + 1)..candidates.len() {
			let (src, dst) = (candidates[i], candidates[j]);
			let (a_i, sig_i) = match graph.node(src) {
				Some(n) => (n.a, n.sig_history),
				None => continue,
			};
			let (a_j, sig_j) = match graph.node(dst) {
				Some(n) => (n.a, n.sig_history),
				None => continue,
			};
			if a_i * a_j < 0.1 {
				continue;
			}
			if graph.find_edge(src, dst).is_some() {
				continue;
			}

			let co = f64::from((sig_i & sig_j).count_ones());
			let similarity = 1.0 - f64::from((sig_i ^ sig_j).count_ones()) / 32.0;
			let novelty = (co / CO_FREQ_REF) * similarity;
			let p_create = params.create_rate * sigmoid(10.0f64.mul_add(novelty, -5.0)) * (1.0 + energy);

			if rng.chance(p_create) {
				if let Ok(hub) = graph.create_node() {
					let wired_i = graph.create_edge(src, hub).is_ok();
					let wired_j = graph.create_edge(dst, hub).is_ok();
					outcome.edges_created += u32::from(wired_i) + u32::from(wired_j);
					if !wired_i && !wired_j {
						graph.delete_node(hub);
					}
				}
			}
		}
	}
}

/// For each non-meta node with enough outgoing connectivity, roll for a new
/// meta-node connected to it, with odds shaped by how densely active its
/// own downstream neighborhood currently is.
fn grow_layer_meta_node(graph: &mut GraphStore, params: &ControlParams, rng: &mut Rng, outcome: &mut GrowthOutcome) {
	let mut outgoing_activity: HashMap<NodeId, f64> = HashMap::new();
	for (_, edge) in graph.iter_edges() {
		if let Some(dst) = graph.node(edge.dst) {
			*outgoing_activity.entry(edge.src).or_insert(0.0) += dst.a;
		}
	}

	let candidates: Vec<(NodeId, u32, f64)> = graph
		.iter_nodes()
		.filter(|(_, n)| !n.is_meta && n.out_deg > 0)
		.map(|(id, n)| (id, n.out_deg, outgoing_activity.get(&id).copied().unwrap_or(0.0)))
		.collect();

	for (src, out_deg, activity_sum) in candidates {
		let density = activity_sum / f64::from(out_deg);
		let p_emerge = params.layer_rate
			* sigmoid(density - DENSITY_REF)
			* sigmoid(f64::from(out_deg) - LAYER_MIN_SIZE)
			* sigmoid(f64::from(out_deg) - LAYER_MIN_SIZE / 2.0);

		if rng.chance(p_emerge) {
			if let Ok(meta_id) = graph.create_node() {
				let cluster_id = graph.node(meta_id).map(|n| n.id);
				if let Some(meta) = graph.node_mut(meta_id) {
					meta.is_meta = true;
					meta.cluster_id = cluster_id;
				}
				if graph.create_edge(src, meta_id).is_ok() {
					outcome.meta_nodes_created += 1;
				} else {
					graph.delete_node(meta_id);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn matching_active_pair_eventually_grows_a_hub_with_two_edges() {
		let mut params = ControlParams::default();
		params.create_rate = 1.0;
		params.sigmoid_k = 2.0;

		let mut created = false;
		for seed in 0..500 {
			let mut g = GraphStore::new(16, 16);
			let a = g.create_node().unwrap();
			let b = g.create_node().unwrap();
			g.node_mut(a).unwrap().a = 1.0;
			g.node_mut(a).unwrap().sig_history = 0xFFFF_FFFF;
			g.node_mut(b).unwrap().a = 1.0;
			g.node_mut(b).unwrap().sig_history = 0xFFFF_FFFF;
			let mut rng = Rng::from_seed(seed);
			let outcome = grow(&mut g, 0.0, &params, &mut rng);
			if outcome.edges_created > 0 {
				created = true;
				assert_eq!(g.node_count(), 3, "a co-activity hub adds exactly one new node");
				break;
			}
		}
		assert!(created, "a co-active, matching-signature pair should eventually grow a hub across enough seeds");
	}

	#[test]
	fn no_growth_among_quiet_nodes() {
		let mut g = GraphStore::new(16, 16);
		let _ = g.create_node().unwrap();
		let _ = g.create_node().unwrap();
		let params = ControlParams::default();
		let mut rng = Rng::from_seed(5);

		let outcome = grow(&mut g, 0.0, &params, &mut rng);

		assert_eq!(outcome.edges_created, 0);
		assert_eq!(outcome.meta_nodes_created, 0);
	}

	#[test]
	fn dense_high_out_degree_node_eventually_grows_a_layer_meta_node() {
		let mut params = ControlParams::default();
		params.layer_rate = 1e-2;

		let mut created = false;
		for seed in 0..500 {
			let mut g = GraphStore::new(32, 32);
			let src = g.create_node().unwrap();
			for _ in 0..12 {
				let dst = g.create_node().unwrap();
				g.node_mut(dst).unwrap().a = 1.0;
				let _ = g.create_edge(src, dst).unwrap();
			}
			let mut rng = Rng::from_seed(seed);
			let outcome = grow(&mut g, 0.0, &params, &mut rng);
			if outcome.meta_nodes_created > 0 {
				created = true;
				let meta = g
					.iter_nodes()
					.find(|(_, n)| n.is_meta)
					.map(|(_, n)| n)
					.expect("a meta-node should exist");
				assert!(meta.cluster_id.is_some());
				break;
			}
		}
		assert!(created, "a dense, high-out-degree node should eventually grow a layer meta-node");
	}

	#[test]
	fn sparse_low_out_degree_node_does_not_grow_a_layer_meta_node() {
		let mut params = ControlParams::default();
		params.layer_rate = 1e-2;

		for seed in 0..50 {
			let mut g = GraphStore::new(8, 8);
			let src = g.create_node().unwrap();
			let dst = g.create_node().unwrap();
			g.node_mut(dst).unwrap().a = 1.0;
			let _ = g.create_edge(src, dst).unwrap();
			let mut rng = Rng::from_seed(seed);
			let outcome = grow(&mut g, 0.0, &params, &mut rng);
			assert_eq!(outcome.meta_nodes_created, 0, "out_deg well below LAYER_MIN_SIZE should never emerge");
		}
	}
}
