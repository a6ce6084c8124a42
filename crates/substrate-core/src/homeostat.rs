//! Homeostatic controller (§4.7).
//!
//! Every 10 ticks, each of the 14 control parameters is nudged by a small,
//! literal additive correction derived from a handful of measured
//! quantities (graph density, activity fraction, prediction accuracy,
//! convergence settle ratio), then the whole bundle is re-clamped. No
//! parameter ever jumps; the controller only ever leans.

use crate::config::ControlParams;

/// Fixed step size scaling every homeostatic correction.
pub const ADAPT_RATE: f64 = 1e-3;

/// Measurements the controller reacts to, aggregated over the window
/// since its last adjustment.
#[derive(Clone, Copy, Debug, Default)]
pub struct HomeostatInputs {
	/// `edges / nodes²`, 0 when `nodes = 0`.
	pub current_density: f64,
	/// `active_node_count / nodes`, 0 when `nodes = 0`.
	pub current_activity: f64,
	/// `1 − mean_error`.
	pub prediction_acc: f64,
	/// `thoughts_settled / (thoughts_settled + thoughts_maxed)`, 0.5 when
	/// both are zero.
	pub settle_ratio: f64,
	/// Mean convergence hop count over the window.
	pub thought_depth: f64,
	/// Mean emergent temporal distance (`stale_ticks`) over fired edges.
	pub mean_temporal_distance: f64,
	/// Mean emergent spatial distance (`1 / s_w`) over fired edges.
	pub mean_spatial_distance: f64,
	/// Fraction of node capacity currently in use.
	pub node_utilization: f64,
	/// Fraction of edge capacity currently in use.
	pub edge_utilization: f64,
}

#[inline]
fn out_of_band_sign(x: f64, lo: f64, hi: f64) -> f64 {
	if x > hi {
		1.0
	} else if x < lo {
		-1.0
	} else {
		0.0
	}
}

#[inline]
fn sign_bool(cond: bool) -> f64 {
	if cond {
		1.0
	} else {
		-1.0
	}
}

/// Nudges every control parameter by its documented additive correction,
/// applies capacity pressure, then re-clamps the whole bundle.
#[derive(Debug, Default)]
pub struct HomeostaticController;

impl HomeostaticController {
	/// Apply one adjustment window to `params` in place.
	pub fn step(params: &mut ControlParams, inputs: &HomeostatInputs) {
		let density = inputs.current_density;
		let activity = inputs.current_activity;
		let acc = inputs.prediction_acc;
		let settle_ratio = inputs.settle_ratio;
		let depth = inputs.thought_depth;

		params.prune_rate += ADAPT_RATE * (density - 0.15);
		params.create_rate += ADAPT_RATE * (0.15 - density) * (1.0 + (acc - 0.85));
		params.activation_scale += ADAPT_RATE * 100.0 * (activity - 0.10);
		params.energy_alpha += ADAPT_RATE * 0.1 * (0.85 - acc);
		params.energy_decay += ADAPT_RATE * 0.01 * ((1.0 - (0.85 - acc).abs()) - 0.5);
		params.sigmoid_k += ADAPT_RATE * out_of_band_sign(activity, 0.05, 0.5);
		params.epsilon_max += ADAPT_RATE * 0.1 * sign_bool(acc < 0.85);
		params.layer_rate += ADAPT_RATE * 0.01 * (density * acc - 0.1);

		let hops_delta = (-(ADAPT_RATE * 10.0) * ((settle_ratio - 0.7) + 0.5 * (depth - 5.0))).round();
		if hops_delta != 0.0 {
			let new_hops = i64::from(params.max_thought_hops) + hops_delta as i64;
			params.max_thought_hops = new_hops.clamp(0, i64::from(u32::MAX)) as u32;
		}

		params.stability_eps += ADAPT_RATE * 0.01 * ((depth - 5.0) / 5.0);
		params.activation_eps += ADAPT_RATE * 0.02 * ((depth - 5.0) / 5.0);
		params.temporal_decay += ADAPT_RATE * 0.1 * ((inputs.mean_temporal_distance - 10.0) / 10.0);
		params.spatial_k += ADAPT_RATE * ((inputs.mean_spatial_distance - 2.0) / 2.0);

		if inputs.node_utilization > 0.8 {
			params.prune_rate *= 1.01;
			params.create_rate *= 0.99;
		}
		if inputs.edge_utilization > 0.8 {
			params.prune_rate *= 1.02;
		}

		params.clamp_all();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dense_graph_raises_prune_rate() {
		let mut params = ControlParams::default();
		let before = params.prune_rate;
		let inputs = HomeostatInputs {
			current_density: 0.9,
			..HomeostatInputs::default()
		};
		HomeostaticController::step(&mut params, &inputs);
		assert!(params.prune_rate > before);
	}

	#[test]
	fn high_capacity_pressure_raises_prune_rate_and_lowers_create_rate() {
		let mut params = ControlParams::default();
		let before_prune = params.prune_rate;
		let before_create = params.create_rate;
		let inputs = HomeostatInputs {
			node_utilization: 0.95,
			edge_utilization: 0.95,
			..HomeostatInputs::default()
		};
		HomeostaticController::step(&mut params, &inputs);
		assert!(params.prune_rate >= before_prune);
		assert!(params.create_rate <= before_create);
	}

	#[test]
	fn low_accuracy_widens_epsilon_max() {
		let mut params = ControlParams::default();
		let before = params.epsilon_max;
		let inputs = HomeostatInputs {
			prediction_acc: 0.2,
			..HomeostatInputs::default()
		};
		HomeostaticController::step(&mut params, &inputs);
		assert!(params.epsilon_max >= before);
	}

	#[test]
	fn epsilon_min_tracks_epsilon_max_after_a_step() {
		let mut params = ControlParams::default();
		let inputs = HomeostatInputs::default();
		HomeostaticController::step(&mut params, &inputs);
		assert!((params.epsilon_min - 0.2 * params.epsilon_max).abs() < 1e-12);
	}

	#[test]
	fn result_always_stays_within_clamp() {
		let mut params = ControlParams::default();
		let inputs = HomeostatInputs {
			current_density: 1.0,
			current_activity: 1.0,
			prediction_acc: 0.0,
			settle_ratio: 0.0,
			thought_depth: 20.0,
			mean_temporal_distance: 1000.0,
			mean_spatial_distance: 1000.0,
			node_utilization: 1.0,
			edge_utilization: 1.0,
		};
		for _ in 0..1000 {
			HomeostaticController::step(&mut params, &inputs);
		}
		let mut clamped = params.clone();
		clamped.clamp_all();
		assert_eq!(params, clamped);
	}
}
