//! Node.js bindings for the substrate-core cognitive substrate.
//!
//! Exposes a single stateful `Substrate` class wrapping a
//! [`substrate_core::TickDriver`] over the reference `substrate-detectors`
//! and `substrate-macros` collaborators. The engine keeps its own graph
//! between calls, so the binding surface is a class the host ticks forward
//! rather than a flat library of pure functions over caller-owned arrays.

// napi-rs requires owned types at the FFI boundary - can't use references
#![allow(clippy::needless_pass_by_value)]
// Tick counts and node/edge counts will never exceed u32::MAX in practice
#![allow(clippy::cast_possible_truncation)]

use std::path::PathBuf;

use napi::bindgen_prelude::*;
use napi_derive::napi;

use substrate_core::{InputSource as _, OutputSink as _, RingChannel, SubstrateConfig, TickDriver};
use substrate_detectors::{BucketConfig, ByteHistogramBank};
use substrate_macros::TableMacroLibrary;

/// Engine type this binding wraps: byte-histogram sensory input, a fixed
/// macro table, and ring-buffer channels on both sides.
type Driver = TickDriver<ByteHistogramBank, TableMacroLibrary, RingChannel, RingChannel>;

/// Startup configuration accepted from JavaScript.
#[napi(object)]
pub struct JsSubstrateConfig {
	/// Maximum live nodes (default: 8192).
	pub node_cap: Option<u32>,
	/// Maximum live edges (default: 65536).
	pub edge_cap: Option<u32>,
	/// Histogram bucket count for the built-in detector bank (default: 64).
	pub sensory_buckets: Option<u32>,
	/// Maximum macros the macro table may hold (default: 512).
	pub macro_cap: Option<u32>,
	/// Ticks between snapshot persistence (default: 2000).
	pub snapshot_period: Option<i64>,
	/// Seed for the substrate's random stream (default: 0).
	pub seed: Option<i64>,
	/// Directory snapshots are written to and loaded from.
	pub snapshot_dir: String,
	/// Byte payloads for macros registered at startup.
	pub macros: Vec<Buffer>,
}

/// One tick's summary statistics, marshalled for JavaScript.
#[napi(object)]
pub struct JsTickStats {
	/// Current tick index.
	pub tick: f64,
	/// Live node count.
	pub node_count: u32,
	/// Live edge count.
	pub edge_count: u32,
	/// Active node count from the final convergence hop.
	pub active_node_count: u32,
	/// Hops the convergence loop took this tick.
	pub thought_depth: u32,
	/// Mean prediction error this tick.
	pub mean_error: f64,
	/// Mean surprise this tick.
	pub mean_surprise: f64,
	/// Energy accumulator after learning.
	pub energy: f64,
	/// Exploration rate after learning.
	pub epsilon: f64,
	/// Edges created by the growth engine this tick.
	pub edges_created: u32,
	/// Meta-nodes created by the growth engine this tick.
	pub meta_nodes_created: u32,
	/// Edges removed by the prune engine this tick.
	pub edges_pruned: u32,
	/// Nodes removed by the prune engine this tick.
	pub nodes_pruned: u32,
	/// Graph density: `edges / nodes²`.
	pub density: f64,
	/// Fraction of live nodes active after the final convergence hop.
	pub activity: f64,
	/// `1 − mean_error`.
	pub accuracy: f64,
	/// Current hard cap on convergence hops.
	pub max_thought_hops: u32,
	/// Mean emergent temporal distance (`stale_ticks`) over fired edges.
	pub mean_temporal_distance: f64,
	/// Mean emergent spatial distance (`1 / s_w`) over fired edges.
	pub mean_spatial_distance: f64,
	/// `1.0` if this tick's convergence loop settled, `0.0` if it maxed out.
	pub settle_ratio: f64,
	/// Current convergence threshold on `|Δ mean_error|`.
	pub stability_eps: f64,
	/// Current decay rate for the temporal propagation weight.
	pub temporal_decay: f64,
}

impl From<substrate_core::TickStats> for JsTickStats {
	fn from(s: substrate_core::TickStats) -> Self {
		Self {
			tick: s.tick as f64,
			node_count: s.node_count,
			edge_count: s.edge_count,
			active_node_count: s.active_node_count,
			thought_depth: s.thought_depth,
			mean_error: s.mean_error,
			mean_surprise: s.mean_surprise,
			energy: s.energy,
			epsilon: s.epsilon,
			edges_created: s.edges_created,
			meta_nodes_created: s.meta_nodes_created,
			edges_pruned: s.edges_pruned,
			nodes_pruned: s.nodes_pruned,
			density: s.density,
			activity: s.activity,
			accuracy: s.accuracy,
			max_thought_hops: s.max_thought_hops,
			mean_temporal_distance: s.mean_temporal_distance,
			mean_spatial_distance: s.mean_spatial_distance,
			settle_ratio: s.settle_ratio,
			stability_eps: s.stability_eps,
			temporal_decay: s.temporal_decay,
		}
	}
}

fn to_napi_err(err: substrate_core::SubstrateError) -> napi::Error {
	napi::Error::from_reason(err.to_string())
}

/// A running cognitive substrate: perceive/converge/learn/act every
/// [`Self::tick`] call, with its own graph and control parameters kept
/// between calls.
#[napi]
pub struct Substrate {
	driver: Driver,
}

#[napi]
impl Substrate {
	/// Build a new substrate from `config`, registering the built-in
	/// detector bank's sensory nodes and any macros supplied up front.
	///
	/// # Errors
	///
	/// Returns an error if the configuration is invalid (e.g. a zero
	/// capacity).
	#[napi(constructor)]
	pub fn new(config: JsSubstrateConfig) -> napi::Result<Self> {
		let core_config = SubstrateConfig {
			node_cap: config.node_cap.unwrap_or(8192),
			edge_cap: config.edge_cap.unwrap_or(65536),
			detector_cap: config.sensory_buckets.unwrap_or(64),
			macro_cap: config.macro_cap.unwrap_or(512),
			tick_period_ms: 50,
			snapshot_period: config.snapshot_period.unwrap_or(2000).max(1) as u64,
			seed: config.seed.unwrap_or(0) as u64,
		};

		let detectors = ByteHistogramBank::new(BucketConfig {
			buckets: core_config.detector_cap,
		});

		let mut macros = TableMacroLibrary::new(core_config.macro_cap as usize);
		for payload in config.macros {
			let _ = macros.register(payload.to_vec());
		}

		let input = RingChannel::new(core_config.detector_cap as usize * 64);
		let output = RingChannel::new(512);

		let driver = TickDriver::new(
			core_config,
			detectors,
			macros,
			input,
			output,
			PathBuf::from(config.snapshot_dir),
		)
		.map_err(to_napi_err)?;

		Ok(Self { driver })
	}

	/// Push raw bytes onto the input channel the detector bank reads from
	/// on the next [`Self::tick`].
	#[napi]
	pub fn push_input(&mut self, bytes: Buffer) {
		self.driver.input_mut().write_frame(bytes.as_ref());
	}

	/// Drain up to `max_bytes` bytes the substrate has emitted via its
	/// output channel so far.
	#[napi]
	pub fn drain_output(&mut self, max_bytes: u32) -> Buffer {
		let mut buf = vec![0u8; max_bytes as usize];
		let n = self.driver.output_mut().read_frame(&mut buf);
		buf.truncate(n);
		buf.into()
	}

	/// Run one tick end-to-end: perceive, converge, learn, homeostasis
	/// (every 10th tick), grow/prune, act, and snapshot (every
	/// `snapshotPeriod` ticks).
	///
	/// # Errors
	///
	/// Returns an error if a due snapshot write fails.
	#[napi]
	pub fn tick(&mut self) -> napi::Result<JsTickStats> {
		self.driver.step().map(Into::into).map_err(to_napi_err)
	}

	/// Run `count` ticks back to back, returning only the final tick's
	/// statistics.
	///
	/// # Errors
	///
	/// Returns an error if any tick's snapshot write fails.
	#[napi]
	pub fn run(&mut self, count: u32) -> napi::Result<JsTickStats> {
		let mut last = self.driver.step().map_err(to_napi_err)?;
		for _ in 1..count {
			last = self.driver.step().map_err(to_napi_err)?;
		}
		Ok(last.into())
	}

	/// Current tick index.
	#[napi]
	pub fn current_tick(&self) -> f64 {
		self.driver.tick() as f64
	}

	/// Current live `[nodeCount, edgeCount]`.
	#[napi]
	pub fn graph_size(&self) -> Vec<u32> {
		vec![
			self.driver.graph().node_count(),
			self.driver.graph().edge_count(),
		]
	}

	/// Write the graph to the configured snapshot directory immediately.
	///
	/// # Errors
	///
	/// Returns an error if the write fails.
	#[napi]
	pub fn snapshot(&self) -> napi::Result<()> {
		self.driver.save_snapshot().map_err(to_napi_err)
	}

	/// Replace the graph wholesale with the snapshot on disk.
	///
	/// # Errors
	///
	/// Returns an error if no snapshot is present or it fails to decode.
	#[napi]
	pub fn load(&mut self) -> napi::Result<()> {
		self.driver.load_snapshot().map_err(to_napi_err)
	}
}

/// Library version.
#[napi]
pub fn version() -> String {
	substrate_core::VERSION.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tmp_dir(tag: &str) -> String {
		std::env::temp_dir()
			.join(format!("substrate-napi-test-{tag}-{}", std::process::id()))
			.to_string_lossy()
			.to_string()
	}

	#[test]
	fn construct_and_tick_without_panicking() {
		let dir = tmp_dir("tick");
		let mut substrate = Substrate::new(JsSubstrateConfig {
			node_cap: Some(64),
			edge_cap: Some(256),
			sensory_buckets: Some(8),
			macro_cap: Some(4),
			snapshot_period: Some(1000),
			seed: Some(7),
			snapshot_dir: dir.clone(),
			macros: vec![],
		})
		.unwrap();

		for _ in 0..20 {
			substrate.tick().unwrap();
		}

		assert_eq!(substrate.current_tick(), 20.0);
		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn pushed_input_reaches_the_detector_bank() {
		let dir = tmp_dir("input");
		let mut substrate = Substrate::new(JsSubstrateConfig {
			node_cap: Some(64),
			edge_cap: Some(256),
			sensory_buckets: Some(4),
			macro_cap: Some(4),
			snapshot_period: Some(1000),
			seed: Some(3),
			snapshot_dir: dir.clone(),
			macros: vec![],
		})
		.unwrap();

		substrate.push_input(vec![0u8; 32].into());
		substrate.tick().unwrap();

		let size = substrate.graph_size();
		assert_eq!(size[0], 4);
		std::fs::remove_dir_all(&dir).ok();
	}
}
