//! Thought-convergence loop (§4.3).
//!
//! A single tick's "thought" is not one propagation pass but a short burst
//! of them, repeated until the graph's activation pattern settles (or a
//! hard hop cap is hit). Structured as a multi-hop spreading loop with an
//! explicit stability criterion instead of a fixed hop count.

use crate::config::ControlParams;
use crate::graph::GraphStore;
use crate::propagate::{propagate, PropagationOutcome};

/// Outcome of one full convergence loop (one tick's worth of hops).
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvergenceOutcome {
	/// Number of propagation hops actually executed.
	pub thought_depth: u32,
	/// `true` if the loop stopped because the stability criterion was met
	/// (as opposed to hitting `max_thought_hops`).
	pub thoughts_settled: bool,
	/// `true` if the loop stopped because `max_thought_hops` was reached.
	pub thoughts_maxed: bool,
	/// Mean absolute prediction error (`|a - hat_prev|`) on the final hop.
	pub mean_error: f64,
	/// Propagation statistics from the final hop.
	pub last_pass: PropagationOutcome,
}

/// Mean absolute error between each live node's freshly committed
/// activation and the prediction it had going into this pass.
fn mean_prediction_error(graph: &GraphStore) -> f64 {
	let mut sum = 0.0_f64;
	let mut count: u64 = 0;
	for (_, node) in graph.iter_nodes() {
		sum += (node.a - node.hat_prev).abs();
		count += 1;
	}
	if count == 0 {
		0.0
	} else {
		sum / count as f64
	}
}

/// Run hops until the graph settles or `max_thought_hops` is reached.
///
/// Settlement requires at least `MIN_THOUGHT_HOPS` and both `|Δ mean_error|
/// < stability_eps` and `activation_delta < activation_eps` on the same
/// hop (§4.3's joint stopping condition — neither threshold alone is
/// sufficient, since a graph can hold steady error while still ringing).
pub fn converge(graph: &mut GraphStore, tick: u64, params: &ControlParams) -> ConvergenceOutcome {
	let mut prev_error = mean_prediction_error(graph);
	let mut last_pass = PropagationOutcome::default();
	let mut hop: u32 = 0;

	loop {
		last_pass = propagate(graph, tick, params);
		hop += 1;
		let error = mean_prediction_error(graph);
		let delta_err = (error - prev_error).abs();
		prev_error = error;

		let settled = hop >= crate::config::MIN_THOUGHT_HOPS
			&& delta_err < params.stability_eps
			&& last_pass.activation_delta < params.activation_eps;

		if settled {
			return ConvergenceOutcome {
				thought_depth: hop,
				thoughts_settled: true,
				thoughts_maxed: false,
				mean_error: error,
				last_pass,
			};
		}
		if hop >= params.max_thought_hops {
			return ConvergenceOutcome {
				thought_depth: hop,
				thoughts_settled: false,
				thoughts_maxed: true,
				mean_error: error,
				last_pass,
			};
		}
	}
}
