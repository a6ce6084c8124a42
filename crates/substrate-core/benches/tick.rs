//! Benchmarks for the tick loop
//!
//! Tests performance of:
//! - A single propagation pass at varying edge density
//! - The thought-convergence loop
//! - A full driver tick (perceive/converge/learn/grow/prune/act) at
//!   varying graph sizes

#![allow(clippy::expect_used)] // Fine in benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use substrate_core::{
	converge, learn, propagate, ControlParams, GraphStore, InputSource, LearningState, MacroLibrary, MacroStats, NodeId,
	OutputSink, Rng, SensoryBank, SubstrateConfig, TickDriver,
};

/// Wires up a ring-with-fanout graph on registration so the full-tick
/// benchmark has real structure for convergence, learning, growth, and
/// pruning to act on, then keeps the ring's first node driven every tick.
struct RingDetectors {
	node_count: u32,
	fanout: u32,
	owned: Vec<NodeId>,
}

impl SensoryBank for RingDetectors {
	fn owned_nodes(&self) -> &[NodeId] {
		&self.owned
	}

	fn ensure_registered(&mut self, graph: &mut GraphStore) -> substrate_core::Result<()> {
		if !self.owned.is_empty() {
			return Ok(());
		}
		let ids: Vec<_> = (0..self.node_count)
			.map(|_| graph.create_node())
			.collect::<Result<_, _>>()?;
		for (i, &id) in ids.iter().enumerate() {
			for step in 1..=self.fanout {
				let dst = ids[(i + step as usize) % ids.len()];
				let _ = graph.create_edge(id, dst);
			}
		}
		self.owned = ids;
		Ok(())
	}

	fn observe(&mut self, graph: &mut GraphStore, _frame: &[u8], tick: u64) {
		let Some(&first) = self.owned.first() else {
			return;
		};
		if let Some(node) = graph.node_mut(first) {
			node.a_prev = node.a;
			node.a = 0.9;
			node.hat = 0.9;
			node.push_signature_bit();
			node.last_tick_seen = tick;
		}
	}
}

struct NoMacros;
impl MacroLibrary for NoMacros {
	fn len(&self) -> usize {
		0
	}
	fn payload(&self, _index: usize) -> &[u8] {
		&[]
	}
	fn stats(&self, _index: usize) -> &MacroStats {
		unreachable!("len() == 0")
	}
	fn record_outcome(&mut self, _index: usize, _reward: f64, _tick: u64) {}
}

struct NullIo;
impl InputSource for NullIo {
	fn read_frame(&mut self, _buf: &mut [u8]) -> usize {
		0
	}
}
impl OutputSink for NullIo {
	fn write_frame(&mut self, _bytes: &[u8]) {}
}

/// Build a graph of `node_count` nodes wired into a ring, each node also
/// connected to its next `fanout` neighbors, with every node driven to a
/// moderate activation so propagation and learning both have real work.
fn build_graph(node_count: u32, fanout: u32) -> GraphStore {
	let mut g = GraphStore::new(node_count + 1, node_count * fanout + 1);
	let ids: Vec<_> = (0..node_count).map(|_| g.create_node().unwrap()).collect();
	for (i, &id) in ids.iter().enumerate() {
		g.node_mut(id).unwrap().a = 0.7;
		for step in 1..=fanout {
			let dst = ids[(i + step as usize) % ids.len()];
			let _ = g.create_edge(id, dst);
		}
	}
	g
}

fn bench_propagate(c: &mut Criterion) {
	let mut group = c.benchmark_group("propagate");
	let params = ControlParams::default();

	for node_count in &[64_u32, 256, 1024, 4096] {
		let mut g = build_graph(*node_count, 4);
		let _ = group.throughput(Throughput::Elements(u64::from(*node_count)));
		let _ = group.bench_with_input(BenchmarkId::new("nodes", node_count), node_count, |bench, _| {
			bench.iter(|| propagate(black_box(&mut g), black_box(0), black_box(&params)));
		});
	}

	group.finish();
}

fn bench_converge(c: &mut Criterion) {
	let mut group = c.benchmark_group("converge");
	let params = ControlParams::default();

	for node_count in &[64_u32, 256, 1024] {
		let mut g = build_graph(*node_count, 4);
		let _ = group.throughput(Throughput::Elements(u64::from(*node_count)));
		let _ = group.bench_with_input(BenchmarkId::new("nodes", node_count), node_count, |bench, _| {
			bench.iter(|| converge(black_box(&mut g), black_box(0), black_box(&params)));
		});
	}

	group.finish();
}

fn bench_learn(c: &mut Criterion) {
	let mut group = c.benchmark_group("learn");
	let params = ControlParams::default();

	for node_count in &[64_u32, 256, 1024] {
		let mut g = build_graph(*node_count, 4);
		let mut state = LearningState::new(&params);
		let mut rng = Rng::from_seed(9);
		let _ = group.throughput(Throughput::Elements(u64::from(*node_count)));
		let _ = group.bench_with_input(BenchmarkId::new("nodes", node_count), node_count, |bench, _| {
			bench.iter(|| learn(black_box(&mut g), black_box(&params), black_box(&mut state), black_box(&mut rng)));
		});
	}

	group.finish();
}

fn bench_full_tick(c: &mut Criterion) {
	let mut group = c.benchmark_group("full_tick");

	for node_count in &[64_u32, 256, 1024] {
		let dir = std::env::temp_dir().join(format!("substrate-bench-tick-{node_count}-{}", std::process::id()));
		let config = SubstrateConfig {
			node_cap: node_count + 16,
			edge_cap: node_count * 8,
			snapshot_period: u64::MAX,
			..SubstrateConfig::default()
		};
		let detectors = RingDetectors {
			node_count: *node_count,
			fanout: 4,
			owned: Vec::new(),
		};
		let mut driver = TickDriver::new(config, detectors, NoMacros, NullIo, NullIo, dir.clone()).expect("valid config");

		// Warm the graph up for a while so growth/prune/learning all have
		// accumulated structure to act on by the time the timed loop starts.
		for _ in 0..200 {
			driver.step().expect("warmup step should not fail");
		}

		let _ = group.throughput(Throughput::Elements(u64::from(*node_count)));
		let _ = group.bench_with_input(BenchmarkId::new("nodes", node_count), node_count, |bench, _| {
			bench.iter(|| driver.step().expect("step should not fail in a benchmark harness"));
		});

		std::fs::remove_dir_all(&dir).ok();
	}

	group.finish();
}

criterion_group!(benches, bench_propagate, bench_converge, bench_learn, bench_full_tick);
criterion_main!(benches);
