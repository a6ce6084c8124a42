//! Tick summary statistics (§6).
//!
//! Emitted via `tracing::info!` every 100 ticks rather than printed
//! directly, so a host process can route it through whatever subscriber
//! it already has configured.

/// One tick's worth of summary numbers, folded from every phase's
/// outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
	/// Current tick index.
	pub tick: u64,
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

/// Emit the summary line for one tick at `info` level, one field per
/// documented quantity.
pub fn report(stats: &TickStats) {
	tracing::info!(
		tick = stats.tick,
		node_count = stats.node_count,
		edge_count = stats.edge_count,
		active_node_count = stats.active_node_count,
		thought_depth = stats.thought_depth,
		mean_error = stats.mean_error,
		mean_surprise = stats.mean_surprise,
		energy = stats.energy,
		epsilon = stats.epsilon,
		edges_created = stats.edges_created,
		meta_nodes_created = stats.meta_nodes_created,
		edges_pruned = stats.edges_pruned,
		nodes_pruned = stats.nodes_pruned,
		density = stats.density,
		activity = stats.activity,
		accuracy = stats.accuracy,
		max_thought_hops = stats.max_thought_hops,
		mean_temporal_distance = stats.mean_temporal_distance,
		mean_spatial_distance = stats.mean_spatial_distance,
		settle_ratio = stats.settle_ratio,
		stability_eps = stats.stability_eps,
		temporal_decay = stats.temporal_decay,
		"tick summary"
	);
}
