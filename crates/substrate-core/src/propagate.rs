//! Propagation engine (§4.2).
//!
//! One propagation pass: accumulate weighted, temporally- and
//! spatially-attenuated upstream contributions into each node's `soma`,
//! then commit a new activation via the logistic squashing function.

use crate::config::ControlParams;
use crate::graph::GraphStore;

/// Decay applied to a node's `burst` accumulator each pass, before that
/// pass's activation is added in. Chosen to give a burst a short
/// multi-tick memory; see DESIGN.md.
const BURST_DECAY: f64 = 0.9;

/// Multiplicative shrink applied to `stale_ticks` when the upstream end of
/// an edge fires strongly.
const STALE_SHRINK: f64 = 0.95;

/// Summary of one propagation pass, feeding both the convergence loop and
/// the homeostatic controller's measurements.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropagationOutcome {
	/// Mean absolute change in activation across all live nodes.
	pub activation_delta: f64,
	/// Count of live nodes with `a > 0.5` after this pass.
	pub active_node_count: u32,
	/// Mean `stale_ticks` over edges whose source fired (`a(src) > 0.1`).
	pub mean_temporal_distance: f64,
	/// Mean `1 / s_w` over the same edge set.
	pub mean_spatial_distance: f64,
}

#[inline]
fn sigmoid(x: f64) -> f64 {
	1.0 / (1.0 + (-x).exp())
}

/// Logistic temporal (freshness) weight: fresher edges contribute more.
#[inline]
#[must_use]
pub fn temporal_weight(stale_ticks: u32, temporal_decay: f64) -> f64 {
	1.0 / (1.0 + f64::from(stale_ticks) * temporal_decay)
}

/// Connectivity-based spatial weight: high-degree junctions attenuate.
#[inline]
#[must_use]
pub fn spatial_weight(out_deg: u32, in_deg: u32, spatial_k: f64) -> f64 {
	1.0 / (1.0 + spatial_k * (f64::from(out_deg + in_deg) + 1.0).ln())
}

/// Run one propagation pass over the whole graph.
///
/// `activation_scale` must be `> 0`; the homeostatic controller's clamp
/// keeps it that way, but callers in a context without that guarantee
/// should check first (§4.2's edge-case note).
pub fn propagate(graph: &mut GraphStore, tick: u64, params: &ControlParams) -> PropagationOutcome {
	debug_assert!(params.activation_scale > 0.0);

	// Step 1: snapshot hat -> hat_prev, then clear soma/hat for this pass.
	for id in graph.live_node_ids() {
		if let Some(n) = graph.node_mut(id) {
			n.hat_prev = n.hat;
			n.soma = 0.0;
			n.hat = 0.0;
		}
	}

	// Step 3: accumulate weighted contributions over every live edge.
	let mut temporal_sum = 0.0_f64;
	let mut spatial_sum = 0.0_f64;
	let mut distance_samples: u64 = 0;

	for edge_id in graph.live_edge_ids() {
		let Some(edge) = graph.edge(edge_id) else {
			continue;
		};
		let (src, dst) = (edge.src, edge.dst);
		let Some(src_node) = graph.node(src) else {
			continue;
		};
		let a_src = src_node.a;
		let stale_ticks_before = edge.stale_ticks;
		let w_eff = edge.w_eff();

		let t_w = temporal_weight(stale_ticks_before, params.temporal_decay);
		let (out_deg, in_deg) = match (graph.node(src), graph.node(dst)) {
			(Some(s), Some(d)) => (s.out_deg, d.in_deg),
			_ => (0, 0),
		};
		let s_w = spatial_weight(out_deg, in_deg, params.spatial_k);
		let contribution = a_src * w_eff * t_w * s_w;

		if let Some(dst_node) = graph.node_mut(dst) {
			dst_node.soma += contribution;
		}

		if let Some(edge_mut) = graph.edge_mut(edge_id) {
			edge_mut.use_count = edge_mut.use_count.saturating_add(a_src.round() as u32);
			if a_src > 0.5 {
				edge_mut.stale_ticks = (f64::from(edge_mut.stale_ticks) * STALE_SHRINK).floor() as u32;
			} else {
				edge_mut.stale_ticks = edge_mut.stale_ticks.saturating_add(1);
			}
			if a_src > 0.1 {
				temporal_sum += f64::from(edge_mut.stale_ticks);
				spatial_sum += 1.0 / s_w;
				distance_samples += 1;
			}
		}
	}

	// Step 4: commit new activations from accumulated soma.
	let mut delta_sum = 0.0_f64;
	let mut node_count: u64 = 0;
	let mut active = 0_u32;

	for id in graph.live_node_ids() {
		let Some(n) = graph.node_mut(id) else {
			continue;
		};
		n.a_prev = n.a;
		if n.in_deg == 0 {
			// Source node (no incoming edges): nothing feeds its soma, so
			// it holds whatever activation the detector bank (or the
			// previous tick) set rather than collapsing to the bias
			// sigmoid. This is how externally driven sensory nodes stay
			// driven across every hop of the convergence loop.
			n.hat = n.a;
		} else {
			n.hat = sigmoid((n.soma - n.theta) / params.activation_scale);
			n.a = n.hat;
		}

		n.total_active_ticks += n.a;
		n.burst = BURST_DECAY * n.burst + n.a;
		n.push_signature_bit();
		if n.a > 0.5 {
			n.last_tick_seen = tick;
		}

		delta_sum += (n.a - n.a_prev).abs();
		node_count += 1;
		if n.a > 0.5 {
			active += 1;
		}
	}

	PropagationOutcome {
		activation_delta: if node_count == 0 {
			0.0
		} else {
			delta_sum / node_count as f64
		},
		active_node_count: active,
		mean_temporal_distance: if distance_samples == 0 {
			0.0
		} else {
			temporal_sum / distance_samples as f64
		},
		mean_spatial_distance: if distance_samples == 0 {
			0.0
		} else {
			spatial_sum / distance_samples as f64
		},
	}
}
