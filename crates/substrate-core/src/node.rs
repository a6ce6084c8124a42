//! Node record.
//!
//! A node is a slot in the graph store's arena (see [`crate::graph`]). It
//! never exists outside that arena; callers only ever see a [`NodeId`].

use serde::{Deserialize, Serialize};

/// Index of a node slot inside the graph store's arena.
///
/// Distinct from the node's logical `id`: a slot can be recycled by the
/// free list and reused by a different logical node, but while it is live
/// the two coincide with the arena index used everywhere else in this
/// crate.
pub type NodeId = u32;

/// Default firing threshold assigned to a freshly created node.
pub const DEFAULT_THETA: f64 = 128.0;

/// A node in the activation graph.
///
/// Fields mirror the logical attributes in the data model: `a`/`a_prev`
/// track activation across a tick, `soma`/`hat`/`hat_prev` are propagation
/// scratch state, and `p1`/`p0` are the decayed marginal-probability
/// baseline used by the learning engine's predictive-lift term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Stable, monotonically assigned identifier (never reused, unlike the
	/// arena slot it currently occupies).
	pub id: u32,
	/// Current activation, in `[0, 1]`.
	pub a: f64,
	/// Activation at the previous tick.
	pub a_prev: f64,
	/// Firing threshold.
	pub theta: f64,
	/// Weighted-input accumulator for the in-flight propagation pass.
	pub soma: f64,
	/// Predicted activation for the in-flight pass (equals `a` once the
	/// pass completes).
	pub hat: f64,
	/// `hat` as it stood before this pass's soma reset — the prediction the
	/// learning engine compares `a` against to compute surprise.
	pub hat_prev: f64,
	/// Cached in-degree, kept consistent with the edge set.
	pub in_deg: u32,
	/// Cached out-degree, kept consistent with the edge set.
	pub out_deg: u32,
	/// Tick index of the most recent strong activation (`a > 0.5`).
	pub last_tick_seen: u64,
	/// Exponentially decayed accumulator of recent activation intensity.
	pub burst: f64,
	/// 32-bit shift register: bit set iff `a > 0.5` that tick, MSB = most
	/// recent. Used for co-occurrence signatures in the growth engine.
	pub sig_history: u32,
	/// Lifetime accumulator of activation, statistics only.
	pub total_active_ticks: f64,
	/// Whether this node represents a cluster (meta-node).
	pub is_meta: bool,
	/// Cluster identifier; only meaningful when `is_meta`.
	pub cluster_id: Option<u32>,
	/// Decayed estimate of `P(a(n) > 0.5)`.
	pub p1: f64,
	/// Decayed estimate of `P(a(n) <= 0.5)`.
	pub p0: f64,
}

impl Node {
	/// Build a freshly initialized node for `create_node`.
	#[must_use]
	pub fn new(id: u32) -> Self {
		Self {
			id,
			a: 0.0,
			a_prev: 0.0,
			theta: DEFAULT_THETA,
			soma: 0.0,
			hat: 0.0,
			hat_prev: 0.0,
			in_deg: 0,
			out_deg: 0,
			last_tick_seen: 0,
			burst: 0.0,
			sig_history: 0,
			total_active_ticks: 0.0,
			is_meta: false,
			cluster_id: None,
			p1: 0.5,
			p0: 0.5,
		}
	}

	/// Whether this node is currently "firing" by the `a > 0.5` convention.
	#[inline]
	#[must_use]
	pub fn is_active(&self) -> bool {
		self.a > 0.5
	}

	/// Shift a new bit into `sig_history`: 1 iff `a` just exceeded 0.5.
	#[inline]
	pub fn push_signature_bit(&mut self) {
		let bit = u32::from(self.is_active());
		self.sig_history = (self.sig_history << 1) | bit;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_node_matches_create_node_contract() {
		let n = Node::new(7);
		assert_eq!(n.theta, 128.0);
		assert_eq!(n.a, 0.0);
		assert_eq!(n.in_deg, 0);
		assert_eq!(n.out_deg, 0);
		assert!((n.p1 + n.p0 - 1.0).abs() < 1e-12);
		assert!(n.p1 > 0.0 && n.p0 > 0.0);
	}

	#[test]
	fn signature_bit_tracks_activity() {
		let mut n = Node::new(0);
		n.a = 0.9;
		n.push_signature_bit();
		assert_eq!(n.sig_history & 1, 1);
		n.a = 0.1;
		n.push_signature_bit();
		assert_eq!(n.sig_history & 1, 0);
		assert_eq!((n.sig_history >> 1) & 1, 1);
	}
}
