//! Local learning engine (§4.4).
//!
//! Runs once per tick, after the thought-convergence loop has settled (or
//! maxed out): every live edge's contribution to the tick's outcome is
//! scored for usefulness and folded into its fast weight immediately, and
//! — on a per-edge probabilistic schedule — consolidated into the slow
//! weight. No edge is singled out by a hard threshold; every adjustment is
//! continuous, scaled by how much the edge actually mattered this tick.

use crate::config::ControlParams;
use crate::edge::EdgeId;
use crate::graph::GraphStore;
use crate::rng::Rng;

/// Decay applied to a node's `p1`/`p0` running baseline and an edge's
/// `c11`/`c10` co-occurrence counters. Shared because both track the same
/// kind of decayed Bernoulli accumulator.
const PROB_DECAY: f64 = 0.99;

/// Smoothing applied to `avg_u` between ticks.
const AVG_U_DECAY: f64 = 0.95;

/// Decay applied to an edge's eligibility trace between ticks.
const ELIGIBILITY_DECAY: f64 = 0.9;

/// Learning rate scaling the raw fast-weight delta before its soft clamp.
const FAST_LEARN_RATE: f64 = 3.0;

/// Soft-clamp bound the raw fast-weight delta is squashed into via
/// `tanh` before it is added to `w_fast`.
const FAST_DELTA_MAX: f64 = 4.0;

/// Relative weight of predictive lift vs. the discrepancy-weighted error
/// term inside usefulness `U = β·u + (1−β)·e`.
const USEFULNESS_BETA: f64 = 0.7;

/// Gain on the credit accumulator's per-tick nudge.
const CREDIT_GAIN: f64 = 10.0;
const CREDIT_CLAMP: i32 = 10_000;

/// Cross-tick state the learning engine owns: the energy accumulator and
/// the derived exploration rate, both referenced by the macro-selection
/// stage (§4.4, §6).
#[derive(Clone, Copy, Debug)]
pub struct LearningState {
	/// Decayed accumulator of recent surprise, feeding `epsilon`.
	pub energy: f64,
	/// Current exploration rate, kept within `[epsilon_min, epsilon_max]`.
	pub epsilon: f64,
}

impl LearningState {
	/// Start at zero energy and maximal exploration, matching a substrate
	/// that has seen nothing yet and should explore freely.
	#[must_use]
	pub fn new(params: &ControlParams) -> Self {
		Self {
			energy: 0.0,
			epsilon: params.epsilon_max,
		}
	}
}

/// Aggregate statistics from one learning pass, folded into the tick's
/// summary line (§6).
#[derive(Clone, Copy, Debug, Default)]
pub struct LearningOutcome {
	/// Mean absolute prediction error across edges with an active endpoint
	/// this tick.
	pub mean_error: f64,
	/// Mean squared surprise over the same edge set.
	pub mean_surprise: f64,
	/// Energy accumulator after this pass.
	pub energy: f64,
	/// Exploration rate after this pass.
	pub epsilon: f64,
}

#[inline]
fn sigmoid(x: f64) -> f64 {
	1.0 / (1.0 + (-x).exp())
}

/// Probability of a slow-weight consolidation roll this tick, rising the
/// longer an edge has gone without one: `0.1·σ((countdown − 50)·k)`.
#[inline]
#[must_use]
fn slow_consolidation_probability(countdown: u32, k: f64) -> f64 {
	0.1 * sigmoid((f64::from(countdown) - 50.0) * k)
}

/// Run the local learning engine over every live node and edge.
pub fn learn(graph: &mut GraphStore, params: &ControlParams, state: &mut LearningState, rng: &mut Rng) -> LearningOutcome {
	// Node side: decay the P(active)/P(inactive) baseline every live node
	// feeds the predictive-lift term with. Continuous contributions, never
	// a hard is_active() gate.
	for id in graph.live_node_ids() {
		if let Some(node) = graph.node_mut(id) {
			node.p1 = PROB_DECAY.mul_add(node.p1, node.a);
			node.p0 = PROB_DECAY.mul_add(node.p0, 1.0 - node.a);
		}
	}

	let edge_ids = graph.live_edge_ids();
	let mut total_error = 0.0_f64;
	let mut total_surprise = 0.0_f64;
	let mut edge_count_active: u64 = 0;
	for edge_id in &edge_ids {
		if let Some(s) = learn_edge(graph, *edge_id, params, rng) {
			total_error += s;
			total_surprise += s * s;
			edge_count_active += 1;
		}
	}
	let denom = edge_count_active.max(1) as f64;
	let mean_error = total_error / denom;
	let mean_surprise = total_surprise / denom;

	state.energy = params.energy_decay.mul_add(state.energy, params.energy_alpha * mean_surprise);
	state.epsilon = (params.epsilon_max - params.epsilon_min).mul_add(sigmoid(state.energy - 0.5), params.epsilon_min);

	LearningOutcome {
		mean_error,
		mean_surprise,
		energy: state.energy,
		epsilon: state.epsilon,
	}
}

/// Score and update a single edge. Returns this edge's surprise this tick
/// (`s = |a_j − hat_j|`), or `None` if either endpoint vanished mid-pass.
fn learn_edge(graph: &mut GraphStore, edge_id: EdgeId, params: &ControlParams, rng: &mut Rng) -> Option<f64> {
	let edge = graph.edge(edge_id)?;
	let (src, dst) = (edge.src, edge.dst);
	let a_i = graph.node(src)?.a_prev;
	let dst_node = graph.node(dst)?;
	let a_j = dst_node.a;
	let hat_j = dst_node.hat_prev;
	let dst_p1 = dst_node.p1;
	let dst_p0 = dst_node.p0;

	let s = (a_j - hat_j).abs();
	let discrepancy = a_i * (a_j - hat_j);

	let edge = graph.edge_mut(edge_id)?;
	edge.c11 = PROB_DECAY.mul_add(edge.c11, a_i * a_j);
	edge.c10 = PROB_DECAY.mul_add(edge.c10, a_i * (1.0 - a_j));

	let total = edge.c11 + edge.c10 + crate::config::PROB_EPSILON;
	let p_j_given_i = edge.c11 / total;
	let p_j = dst_p1 / (dst_p1 + dst_p0 + crate::config::PROB_EPSILON);
	let lift = p_j_given_i - p_j;

	let error_component = discrepancy * s;
	let usefulness = USEFULNESS_BETA.mul_add(lift, (1.0 - USEFULNESS_BETA) * error_component);

	edge.avg_u = AVG_U_DECAY.mul_add(edge.avg_u, (1.0 - AVG_U_DECAY) * usefulness);
	edge.eligibility = ELIGIBILITY_DECAY * edge.eligibility + a_i;

	let raw_delta = FAST_LEARN_RATE * usefulness * edge.eligibility;
	let delta = FAST_DELTA_MAX * (raw_delta / FAST_DELTA_MAX).tanh();
	let new_fast = f64::from(edge.w_fast) + delta;
	edge.w_fast = new_fast.round().clamp(0.0, 255.0) as u8;

	let credit_delta = (CREDIT_GAIN * (1.0 - s) * usefulness).round() as i32;
	edge.credit = (edge.credit + credit_delta).clamp(-CREDIT_CLAMP, CREDIT_CLAMP);

	let consolidate_p = slow_consolidation_probability(edge.slow_update_countdown, params.sigmoid_k);
	if rng.chance(consolidate_p) {
		let bump = (20.0 * edge.avg_u).tanh();
		let new_slow = f64::from(edge.w_slow) + bump;
		edge.w_slow = new_slow.round().clamp(0.0, 255.0) as u8;
		edge.slow_update_countdown = 0;
	} else {
		edge.slow_update_countdown += 1;
	}

	Some(s)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wired_pair() -> (GraphStore, EdgeId) {
		let mut g = GraphStore::new(8, 8);
		let a = g.create_node().unwrap();
		let b = g.create_node().unwrap();
		let e = g.create_edge(a, b).unwrap();
		(g, e)
	}

	#[test]
	fn weights_never_leave_byte_range() {
		let (mut g, e) = wired_pair();
		let params = ControlParams::default();
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(3);

		for tick in 0..200u64 {
			g.node_mut(g.edge(e).unwrap().src).unwrap().a_prev = if tick % 2 == 0 { 1.0 } else { 0.0 };
			g.node_mut(g.edge(e).unwrap().dst).unwrap().a = 1.0;
			learn(&mut g, &params, &mut state, &mut rng);
		}
		let edge = g.edge(e).unwrap();
		assert!(edge.w_fast <= 255);
		assert!(edge.w_slow <= 255);
	}

	#[test]
	fn credit_stays_within_clamp() {
		let (mut g, e) = wired_pair();
		let params = ControlParams::default();
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(13);

		for _ in 0..5000 {
			g.node_mut(g.edge(e).unwrap().src).unwrap().a_prev = 1.0;
			learn(&mut g, &params, &mut state, &mut rng);
		}
		assert!(g.edge(e).unwrap().credit.abs() <= CREDIT_CLAMP);
	}

	#[test]
	fn epsilon_stays_within_configured_bounds() {
		let (mut g, _e) = wired_pair();
		let params = ControlParams::default();
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(11);

		for _ in 0..50 {
			let outcome = learn(&mut g, &params, &mut state, &mut rng);
			assert!(outcome.epsilon >= params.epsilon_min - 1e-9);
			assert!(outcome.epsilon <= params.epsilon_max + 1e-9);
		}
	}

	#[test]
	fn epsilon_is_the_documented_function_of_energy() {
		let (mut g, _e) = wired_pair();
		let params = ControlParams::default();
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(17);

		let outcome = learn(&mut g, &params, &mut state, &mut rng);
		let expected =
			(params.epsilon_max - params.epsilon_min).mul_add(sigmoid(outcome.energy - 0.5), params.epsilon_min);
		assert!((outcome.epsilon - expected).abs() < 1e-12);
	}

	#[test]
	fn eligibility_trace_grows_monotonically_under_sustained_presynaptic_activity() {
		let (mut g, e) = wired_pair();
		let params = ControlParams::default();
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(19);

		let mut prev = 0.0_f64;
		for _ in 0..10 {
			g.node_mut(g.edge(e).unwrap().src).unwrap().a_prev = 1.0;
			learn(&mut g, &params, &mut state, &mut rng);
			let current = g.edge(e).unwrap().eligibility;
			assert!(current > prev, "eligibility should climb toward its steady state while a_i stays 1");
			prev = current;
		}
	}

	#[test]
	fn slow_consolidation_probability_rises_with_dormancy() {
		let low = slow_consolidation_probability(0, 1.0);
		let mid = slow_consolidation_probability(50, 1.0);
		let high = slow_consolidation_probability(500, 1.0);
		assert!(low < mid);
		assert!(mid < high);
		assert!(high <= 0.1 + 1e-12);
	}

	#[test]
	fn baseline_probability_climbs_toward_one_under_sustained_activation() {
		let (mut g, e) = wired_pair();
		let params = ControlParams::default();
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(23);

		for _ in 0..500 {
			let src = g.edge(e).unwrap().src;
			g.node_mut(src).unwrap().a = 1.0;
			learn(&mut g, &params, &mut state, &mut rng);
		}
		let p1 = g.node(g.edge(e).unwrap().src).unwrap().p1;
		let p0 = g.node(g.edge(e).unwrap().src).unwrap().p0;
		assert!(p1 / (p1 + p0 + crate::config::PROB_EPSILON) > 0.9);
	}
}
