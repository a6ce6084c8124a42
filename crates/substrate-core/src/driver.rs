//! Tick driver (§4.8): orchestrates one tick end-to-end.
//!
//! Phase order is fixed and never reordered: perceive, then converge and
//! learn, then (every 10 ticks) homeostasis, then growth and pruning, then
//! macro selection and action, then (every `snapshot_period` ticks)
//! persistence, then the tick counter advances.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use smallvec::SmallVec;

use crate::config::{ControlParams, SubstrateConfig, FRAME_SIZE};
use crate::contracts::{InputSource, MacroLibrary, OutputSink, SensoryBank};
use crate::convergence::converge;
use crate::error::Result;
use crate::graph::GraphStore;
use crate::growth::grow;
use crate::homeostat::{HomeostatInputs, HomeostaticController};
use crate::learning::{learn, LearningState};
use crate::persistence;
use crate::prune::prune;
use crate::rng::Rng;
use crate::stats::{report, TickStats};

/// Ticks between homeostatic controller adjustments.
const HOMEOSTAT_PERIOD: u64 = 10;
/// Ticks between `tracing::info!` summary lines.
const REPORT_PERIOD: u64 = 100;

/// Rolling accumulator for the measurements the homeostatic controller
/// reacts to, reset every `HOMEOSTAT_PERIOD` ticks.
#[derive(Clone, Copy, Debug, Default)]
struct HomeostatWindow {
	ticks: u32,
	error_sum: f64,
	settled_count: u32,
	maxed_count: u32,
	temporal_sum: f64,
	spatial_sum: f64,
	active_sum: u64,
	thought_depth_sum: u64,
}

impl HomeostatWindow {
	#[allow(clippy::too_many_arguments)]
	fn record(&mut self, mean_error: f64, settled: bool, maxed: bool, temporal: f64, spatial: f64, active_node_count: u32, thought_depth: u32) {
		self.ticks += 1;
		self.error_sum += mean_error;
		self.settled_count += u32::from(settled);
		self.maxed_count += u32::from(maxed);
		self.temporal_sum += temporal;
		self.spatial_sum += spatial;
		self.active_sum += u64::from(active_node_count);
		self.thought_depth_sum += u64::from(thought_depth);
	}

	fn inputs(&self, graph: &GraphStore) -> HomeostatInputs {
		let n = f64::from(self.ticks.max(1));
		let nodes = graph.node_count();
		let edges = graph.edge_count();
		let current_density = if nodes == 0 {
			0.0
		} else {
			f64::from(edges) / (f64::from(nodes) * f64::from(nodes))
		};
		let mean_active = self.active_sum as f64 / n;
		let current_activity = if nodes == 0 { 0.0 } else { mean_active / f64::from(nodes) };
		let mean_error = self.error_sum / n;
		let settle_ratio = if self.settled_count == 0 && self.maxed_count == 0 {
			0.5
		} else {
			f64::from(self.settled_count) / f64::from(self.settled_count + self.maxed_count)
		};
		HomeostatInputs {
			current_density,
			current_activity,
			prediction_acc: 1.0 - mean_error,
			settle_ratio,
			thought_depth: self.thought_depth_sum as f64 / n,
			mean_temporal_distance: self.temporal_sum / n,
			mean_spatial_distance: self.spatial_sum / n,
			node_utilization: f64::from(nodes) / f64::from(graph.node_cap().max(1)),
			edge_utilization: f64::from(edges) / f64::from(graph.edge_cap().max(1)),
		}
	}
}

/// Owns the graph, its control parameters, and every external
/// collaborator, and steps them all forward one tick at a time.
pub struct TickDriver<D, L, I, O>
where
	D: SensoryBank,
	L: MacroLibrary,
	I: InputSource,
	O: OutputSink,
{
	graph: GraphStore,
	params: ControlParams,
	learning_state: LearningState,
	rng: Rng,
	detectors: D,
	macros: L,
	input: I,
	output: O,
	tick: u64,
	config: SubstrateConfig,
	snapshot_dir: PathBuf,
	window: HomeostatWindow,
}

impl<D, L, I, O> TickDriver<D, L, I, O>
where
	D: SensoryBank,
	L: MacroLibrary,
	I: InputSource,
	O: OutputSink,
{
	/// Build a new driver, validating `config` and registering the
	/// detector bank's sensory nodes.
	///
	/// # Errors
	///
	/// Returns [`SubstrateError::InvalidConfig`] if `config` is invalid, or
	/// whatever error the detector bank reports while registering.
	pub fn new(config: SubstrateConfig, mut detectors: D, macros: L, input: I, output: O, snapshot_dir: PathBuf) -> Result<Self> {
		config.validate()?;
		let mut graph = GraphStore::new(config.node_cap, config.edge_cap);
		detectors.ensure_registered(&mut graph)?;
		let params = ControlParams::default();
		let learning_state = LearningState::new(&params);
		let rng = Rng::from_seed(config.seed);
		Ok(Self {
			graph,
			params,
			learning_state,
			rng,
			detectors,
			macros,
			input,
			output,
			tick: 0,
			config,
			snapshot_dir,
			window: HomeostatWindow::default(),
		})
	}

	/// Current tick index.
	#[must_use]
	pub fn tick(&self) -> u64 {
		self.tick
	}

	/// Borrow the underlying graph store, e.g. for inspection in tests.
	#[must_use]
	pub fn graph(&self) -> &GraphStore {
		&self.graph
	}

	/// Current control parameters.
	#[must_use]
	pub fn params(&self) -> &ControlParams {
		&self.params
	}

	/// Mutably borrow the input channel, e.g. so a host can push bytes onto
	/// it ahead of the next [`Self::step`].
	pub fn input_mut(&mut self) -> &mut I {
		&mut self.input
	}

	/// Mutably borrow the output channel, e.g. so a host can drain bytes
	/// the last [`Self::step`] emitted.
	pub fn output_mut(&mut self) -> &mut O {
		&mut self.output
	}

	/// Write the graph to `snapshot_dir` immediately, outside the normal
	/// `snapshot_period` cadence.
	///
	/// # Errors
	///
	/// Returns [`SubstrateError::PersistenceFailed`] if the write fails.
	pub fn save_snapshot(&self) -> Result<()> {
		persistence::save(&self.snapshot_dir, &self.graph)
	}

	/// Replace the graph wholesale with the snapshot in `snapshot_dir`.
	///
	/// # Errors
	///
	/// Returns [`SubstrateError::PersistenceFailed`] if no snapshot is
	/// present or it fails to decode.
	pub fn load_snapshot(&mut self) -> Result<()> {
		persistence::load(&self.snapshot_dir, &mut self.graph)
	}

	/// Run one tick end-to-end, returning its summary statistics.
	///
	/// # Errors
	///
	/// Growth, pruning, and persistence failures are recorded in the
	/// returned stats rather than propagated (§7: only configuration
	/// errors are fatal); this only returns `Err` if persistence fails in
	/// a way the caller should know about immediately.
	pub fn step(&mut self) -> Result<TickStats> {
		// 1. Perceive.
		let mut frame: SmallVec<[u8; FRAME_SIZE]> = smallvec::smallvec![0; FRAME_SIZE];
		let n = self.input.read_frame(&mut frame);
		self.detectors.observe(&mut self.graph, &frame[..n], self.tick);

		// 2. Converge, then learn.
		let convergence = converge(&mut self.graph, self.tick, &self.params);
		let learning = learn(&mut self.graph, &self.params, &mut self.learning_state, &mut self.rng);

		self.window.record(
			learning.mean_error,
			convergence.thoughts_settled,
			convergence.thoughts_maxed,
			convergence.last_pass.mean_temporal_distance,
			convergence.last_pass.mean_spatial_distance,
			convergence.last_pass.active_node_count,
			convergence.thought_depth,
		);

		// 3. Homeostasis, every HOMEOSTAT_PERIOD ticks.
		if self.tick > 0 && self.tick % HOMEOSTAT_PERIOD == 0 {
			let inputs = self.window.inputs(&self.graph);
			HomeostaticController::step(&mut self.params, &inputs);
			self.window = HomeostatWindow::default();
		}

		// 4. Growth, then pruning.
		let growth = grow(&mut self.graph, learning.energy, &self.params, &mut self.rng);
		let pruned = prune(&mut self.graph, self.tick, &self.params, &mut self.rng);

		// 5. Macro selection and action.
		self.act(learning.mean_error);

		// 6. Persistence, every snapshot_period ticks.
		if self.tick > 0 && self.tick % self.config.snapshot_period == 0 {
			persistence::save(&self.snapshot_dir, &self.graph)?;
		}

		let node_count = self.graph.node_count();
		let edge_count = self.graph.edge_count();
		let density = if node_count == 0 {
			0.0
		} else {
			f64::from(edge_count) / (f64::from(node_count) * f64::from(node_count))
		};
		let activity = if node_count == 0 {
			0.0
		} else {
			f64::from(convergence.last_pass.active_node_count) / f64::from(node_count)
		};

		let stats = TickStats {
			tick: self.tick,
			node_count,
			edge_count,
			active_node_count: convergence.last_pass.active_node_count,
			thought_depth: convergence.thought_depth,
			mean_error: learning.mean_error,
			mean_surprise: learning.mean_surprise,
			energy: learning.energy,
			epsilon: learning.epsilon,
			edges_created: growth.edges_created,
			meta_nodes_created: growth.meta_nodes_created,
			edges_pruned: pruned.edges_pruned,
			nodes_pruned: pruned.nodes_pruned,
			density,
			activity,
			accuracy: 1.0 - learning.mean_error,
			max_thought_hops: self.params.max_thought_hops,
			mean_temporal_distance: convergence.last_pass.mean_temporal_distance,
			mean_spatial_distance: convergence.last_pass.mean_spatial_distance,
			settle_ratio: f64::from(u8::from(convergence.thoughts_settled)),
			stability_eps: self.params.stability_eps,
			temporal_decay: self.params.temporal_decay,
		};
		if self.tick % REPORT_PERIOD == 0 {
			report(&stats);
		}

		// 7. Advance.
		self.tick += 1;
		Ok(stats)
	}

	/// Run ticks forever, sleeping `tick_period_ms` between each one.
	///
	/// # Errors
	///
	/// Propagates the first persistence failure from [`Self::step`].
	pub fn run_forever(&mut self) -> Result<()> {
		loop {
			self.step()?;
			thread::sleep(Duration::from_millis(self.config.tick_period_ms));
		}
	}

	/// ε-greedy macro selection, emission, and utility update.
	fn act(&mut self, mean_error: f64) {
		if self.macros.is_empty() {
			return;
		}
		let index = if self.rng.chance(self.learning_state.epsilon) {
			self.rng.below(self.macros.len())
		} else {
			(0..self.macros.len())
				.max_by(|&a, &b| {
					self.macros.stats(a)
						.blended()
						.partial_cmp(&self.macros.stats(b).blended())
						.unwrap_or(std::cmp::Ordering::Equal)
				})
				.unwrap_or(0)
		};
		let reward = 1.0 - mean_error.clamp(0.0, 1.0);
		self.macros.record_outcome(index, reward, self.tick);
		let payload = self.macros.payload(index).to_vec();
		self.output.write_frame(&payload);
	}
}
