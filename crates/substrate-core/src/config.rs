//! Configuration surfaces.
//!
//! Two distinct configs: [`SubstrateConfig`] is the static, validated
//! surface the host passes in once at startup (§6's "configuration
//! surface"); [`ControlParams`] is the live, self-adjusting bundle of the
//! 14 scalars the homeostatic controller nudges every 10 ticks (§3/§4.7).

use serde::{Deserialize, Serialize};

use crate::error::SubstrateError;

/// Default bytes read from the input channel per tick.
pub const FRAME_SIZE: usize = 4096;
/// Default ring-buffer capacity: `4 * FRAME_SIZE`.
pub const RING_CAPACITY: usize = 4 * FRAME_SIZE;
/// Hops required before the convergence loop is allowed to declare
/// settlement.
pub const MIN_THOUGHT_HOPS: u32 = 3;
/// `ε` added to probability ratios to avoid division by zero.
pub const PROB_EPSILON: f64 = 1e-6;

/// Static configuration accepted by the tick driver at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubstrateConfig {
	/// Maximum live nodes.
	pub node_cap: u32,
	/// Maximum live edges.
	pub edge_cap: u32,
	/// Maximum sensory detectors the detector bank may register.
	pub detector_cap: u32,
	/// Maximum macros the macro library may hold.
	pub macro_cap: u32,
	/// Target wall-clock period between ticks.
	pub tick_period_ms: u64,
	/// Ticks between snapshot persistence.
	pub snapshot_period: u64,
	/// Seed for the substrate's random stream.
	pub seed: u64,
}

impl Default for SubstrateConfig {
	fn default() -> Self {
		Self {
			node_cap: 8192,
			edge_cap: 65536,
			detector_cap: 128,
			macro_cap: 512,
			tick_period_ms: 50,
			snapshot_period: 2000,
			seed: 0,
		}
	}
}

impl SubstrateConfig {
	/// Validate the configuration, turning a structurally impossible setup
	/// into the fatal startup error from §7 rather than a later panic.
	///
	/// # Errors
	///
	/// Returns [`SubstrateError::InvalidConfig`] if any capacity is zero or
	/// the detector/macro caps exceed their hard ceilings.
	pub fn validate(&self) -> Result<(), SubstrateError> {
		if self.node_cap == 0 {
			return Err(SubstrateError::InvalidConfig(
				"node_cap must be > 0".to_string(),
			));
		}
		if self.edge_cap == 0 {
			return Err(SubstrateError::InvalidConfig(
				"edge_cap must be > 0".to_string(),
			));
		}
		if self.detector_cap == 0 {
			return Err(SubstrateError::InvalidConfig(
				"detector_cap must be > 0".to_string(),
			));
		}
		if self.macro_cap == 0 {
			return Err(SubstrateError::InvalidConfig(
				"macro_cap must be > 0".to_string(),
			));
		}
		if self.tick_period_ms == 0 {
			return Err(SubstrateError::InvalidConfig(
				"tick_period_ms must be > 0".to_string(),
			));
		}
		if self.snapshot_period == 0 {
			return Err(SubstrateError::InvalidConfig(
				"snapshot_period must be > 0".to_string(),
			));
		}
		Ok(())
	}
}

/// Clamp interval helper: `(min, max)`.
pub type Clamp = (f64, f64);

/// Clamp interval for `prune_rate` and `layer_rate`.
pub const RATE_CLAMP: Clamp = (1e-4, 1e-2);
/// Clamp interval for `create_rate`.
pub const CREATE_RATE_CLAMP: Clamp = (1e-3, 0.1);
/// Clamp interval for `activation_scale`.
pub const ACTIVATION_SCALE_CLAMP: Clamp = (16.0, 256.0);
/// Clamp interval for `energy_alpha`.
pub const ENERGY_ALPHA_CLAMP: Clamp = (1e-2, 0.5);
/// Clamp interval for `energy_decay`.
pub const ENERGY_DECAY_CLAMP: Clamp = (0.95, 0.999);
/// Clamp interval for `sigmoid_k`.
pub const SIGMOID_K_CLAMP: Clamp = (0.1, 2.0);
/// Clamp interval for `epsilon_max`.
pub const EPSILON_MAX_CLAMP: Clamp = (0.2, 0.5);
/// Clamp interval (as integers) for `max_thought_hops`.
pub const MAX_THOUGHT_HOPS_CLAMP: (u32, u32) = (3, 20);
/// Clamp interval for `stability_eps`.
pub const STABILITY_EPS_CLAMP: Clamp = (1e-3, 5e-2);
/// Clamp interval for `activation_eps`.
pub const ACTIVATION_EPS_CLAMP: Clamp = (5e-3, 0.1);
/// Clamp interval for `temporal_decay`.
pub const TEMPORAL_DECAY_CLAMP: Clamp = (1e-2, 0.5);
/// Clamp interval for `spatial_k`.
pub const SPATIAL_K_CLAMP: Clamp = (0.1, 2.0);

/// The 14 adaptive control parameters (§3, §4.7), bundled into one owned
/// struct per the design notes rather than scattered globals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlParams {
	/// Logistic steepness used wherever an implementation is free to
	/// choose `k` (e.g. the slow-weight consolidation gate).
	pub sigmoid_k: f64,
	/// Base pruning probability multiplier.
	pub prune_rate: f64,
	/// Base edge/meta-node creation probability multiplier.
	pub create_rate: f64,
	/// Base layer-meta-node emergence probability multiplier.
	pub layer_rate: f64,
	/// Gain on surprise feeding `energy`.
	pub energy_alpha: f64,
	/// Per-tick decay of `energy`.
	pub energy_decay: f64,
	/// Lower bound of the exploration rate (derived: `0.2 * epsilon_max`).
	pub epsilon_min: f64,
	/// Upper bound of the exploration rate.
	pub epsilon_max: f64,
	/// Logistic activation scale in the propagation pass.
	pub activation_scale: f64,
	/// Hard cap on hops inside the convergence loop.
	pub max_thought_hops: u32,
	/// Convergence threshold on `|Δ mean_error|`.
	pub stability_eps: f64,
	/// Convergence threshold on mean `|Δ a|`.
	pub activation_eps: f64,
	/// Decay rate for the temporal (freshness) propagation weight.
	pub temporal_decay: f64,
	/// Steepness for the spatial (degree-based) propagation weight.
	pub spatial_k: f64,
}

impl Default for ControlParams {
	fn default() -> Self {
		let epsilon_max = 0.3;
		Self {
			sigmoid_k: 1.0,
			prune_rate: 5e-4,
			create_rate: 0.01,
			layer_rate: 1e-3,
			energy_alpha: 0.1,
			energy_decay: 0.98,
			epsilon_min: 0.2 * epsilon_max,
			epsilon_max,
			activation_scale: 64.0,
			max_thought_hops: 10,
			stability_eps: 0.01,
			activation_eps: 0.02,
			temporal_decay: 0.05,
			spatial_k: 0.5,
		}
	}
}

impl ControlParams {
	/// Re-clamp every field to its documented interval. Called after every
	/// homeostatic adjustment so a faulty nudge can never leave a
	/// parameter outside its hard range.
	pub fn clamp_all(&mut self) {
		self.sigmoid_k = self.sigmoid_k.clamp(SIGMOID_K_CLAMP.0, SIGMOID_K_CLAMP.1);
		self.prune_rate = self.prune_rate.clamp(RATE_CLAMP.0, RATE_CLAMP.1);
		self.create_rate = self
			.create_rate
			.clamp(CREATE_RATE_CLAMP.0, CREATE_RATE_CLAMP.1);
		self.layer_rate = self.layer_rate.clamp(RATE_CLAMP.0, RATE_CLAMP.1);
		self.energy_alpha = self
			.energy_alpha
			.clamp(ENERGY_ALPHA_CLAMP.0, ENERGY_ALPHA_CLAMP.1);
		self.energy_decay = self
			.energy_decay
			.clamp(ENERGY_DECAY_CLAMP.0, ENERGY_DECAY_CLAMP.1);
		self.epsilon_max = self
			.epsilon_max
			.clamp(EPSILON_MAX_CLAMP.0, EPSILON_MAX_CLAMP.1);
		self.epsilon_min = 0.2 * self.epsilon_max;
		self.activation_scale = self
			.activation_scale
			.clamp(ACTIVATION_SCALE_CLAMP.0, ACTIVATION_SCALE_CLAMP.1);
		self.max_thought_hops = self
			.max_thought_hops
			.clamp(MAX_THOUGHT_HOPS_CLAMP.0, MAX_THOUGHT_HOPS_CLAMP.1);
		self.stability_eps = self
			.stability_eps
			.clamp(STABILITY_EPS_CLAMP.0, STABILITY_EPS_CLAMP.1);
		self.activation_eps = self
			.activation_eps
			.clamp(ACTIVATION_EPS_CLAMP.0, ACTIVATION_EPS_CLAMP.1);
		self.temporal_decay = self
			.temporal_decay
			.clamp(TEMPORAL_DECAY_CLAMP.0, TEMPORAL_DECAY_CLAMP.1);
		self.spatial_k = self.spatial_k.clamp(SPATIAL_K_CLAMP.0, SPATIAL_K_CLAMP.1);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_validates() {
		assert!(SubstrateConfig::default().validate().is_ok());
	}

	#[test]
	fn zero_node_cap_is_fatal() {
		let cfg = SubstrateConfig {
			node_cap: 0,
			..SubstrateConfig::default()
		};
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn default_params_are_within_clamp() {
		let mut p = ControlParams::default();
		let before = p.clone();
		p.clamp_all();
		assert_eq!(before, p);
	}

	#[test]
	fn clamp_all_repairs_out_of_range_values() {
		let mut p = ControlParams::default();
		p.activation_scale = -5.0;
		p.max_thought_hops = 1000;
		p.prune_rate = 10.0;
		p.clamp_all();
		assert!(p.activation_scale >= ACTIVATION_SCALE_CLAMP.0);
		assert!(p.max_thought_hops <= MAX_THOUGHT_HOPS_CLAMP.1);
		assert!(p.prune_rate <= RATE_CLAMP.1);
	}

	#[test]
	fn epsilon_min_is_derived() {
		let mut p = ControlParams::default();
		p.epsilon_max = 0.4;
		p.clamp_all();
		assert!((p.epsilon_min - 0.08).abs() < 1e-12);
	}
}
