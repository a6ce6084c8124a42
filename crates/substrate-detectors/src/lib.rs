//! Reference sensory detector: a byte-histogram bank.
//!
//! One sensory node per histogram bucket, each node's activation set to the
//! fraction of this tick's input frame whose bytes fall in that bucket. A
//! config struct drives a pure detection function over a byte buffer,
//! generalized from a single detector function to a fixed population of
//! sensory nodes the core substrate can wire edges onto.

#![warn(missing_docs)]
#![warn(clippy::all)]

use substrate_core::{GraphStore, NodeId, Result, SensoryBank};

/// Exponential decay applied to a sensory node's `burst` accumulator each
/// tick, before this tick's activation is folded in. Matches the
/// propagation pass's own `BURST_DECAY` so sensory and derived nodes carry
/// burst history on the same timescale.
const BURST_DECAY: f64 = 0.9;

/// Default bucket count: one node per quartet of the byte range.
pub const DEFAULT_BUCKETS: u32 = 64;

/// Configuration for [`ByteHistogramBank`].
#[derive(Clone, Copy, Debug)]
pub struct BucketConfig {
	/// Number of histogram buckets (and therefore sensory nodes). Must
	/// divide evenly into 256 for an even bucket width; any value in
	/// `1..=256` is accepted, with the last bucket absorbing the remainder.
	pub buckets: u32,
}

impl Default for BucketConfig {
	fn default() -> Self {
		Self {
			buckets: DEFAULT_BUCKETS,
		}
	}
}

/// A [`SensoryBank`] that turns each tick's raw input frame into a
/// byte-value histogram, one sensory node per bucket.
///
/// Registration is idempotent and happens once: [`Self::ensure_registered`]
/// allocates `buckets` nodes the first time it is called and is a no-op on
/// every subsequent call, so a detector bank can be attached to an
/// already-running substrate without duplicating its sensory population.
#[derive(Debug)]
pub struct ByteHistogramBank {
	config: BucketConfig,
	owned: Vec<NodeId>,
}

impl ByteHistogramBank {
	/// Build a bank that has not yet registered any nodes.
	#[must_use]
	pub fn new(config: BucketConfig) -> Self {
		Self {
			config,
			owned: Vec::new(),
		}
	}

	/// Bucket index a byte value falls into.
	#[inline]
	fn bucket_for(&self, byte: u8) -> usize {
		let buckets = self.config.buckets.max(1);
		let idx = u32::from(byte) * buckets / 256;
		idx.min(buckets - 1) as usize
	}
}

impl SensoryBank for ByteHistogramBank {
	fn owned_nodes(&self) -> &[NodeId] {
		&self.owned
	}

	fn ensure_registered(&mut self, graph: &mut GraphStore) -> Result<()> {
		if !self.owned.is_empty() {
			return Ok(());
		}
		let buckets = self.config.buckets.max(1);
		self.owned.reserve(buckets as usize);
		for _ in 0..buckets {
			self.owned.push(graph.create_node()?);
		}
		Ok(())
	}

	fn observe(&mut self, graph: &mut GraphStore, frame: &[u8], tick: u64) {
		let mut counts = vec![0u32; self.owned.len()];
		for &byte in frame {
			let bucket = self.bucket_for(byte);
			if let Some(c) = counts.get_mut(bucket) {
				*c += 1;
			}
		}

		let total = frame.len().max(1) as f64;
		for (bucket, &node_id) in self.owned.iter().enumerate() {
			let Some(node) = graph.node_mut(node_id) else {
				continue;
			};
			let activation = f64::from(counts[bucket]) / total;
			node.a_prev = node.a;
			node.a = activation;
			node.hat = activation;
			node.total_active_ticks += node.a;
			node.burst = BURST_DECAY.mul_add(node.burst, node.a);
			node.push_signature_bit();
			if node.is_active() {
				node.last_tick_seen = tick;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registration_allocates_one_node_per_bucket() {
		let mut graph = GraphStore::new(128, 32);
		let mut bank = ByteHistogramBank::new(BucketConfig { buckets: 16 });
		bank.ensure_registered(&mut graph).unwrap();
		assert_eq!(bank.owned_nodes().len(), 16);
		assert_eq!(graph.node_count(), 16);
	}

	#[test]
	fn registration_is_idempotent() {
		let mut graph = GraphStore::new(128, 32);
		let mut bank = ByteHistogramBank::new(BucketConfig::default());
		bank.ensure_registered(&mut graph).unwrap();
		bank.ensure_registered(&mut graph).unwrap();
		assert_eq!(graph.node_count(), u32::from(DEFAULT_BUCKETS != 0) * DEFAULT_BUCKETS);
	}

	#[test]
	fn a_frame_of_one_repeated_byte_lights_exactly_one_bucket() {
		let mut graph = GraphStore::new(128, 32);
		let mut bank = ByteHistogramBank::new(BucketConfig { buckets: 4 });
		bank.ensure_registered(&mut graph).unwrap();

		let frame = [0u8; 64];
		bank.observe(&mut graph, &frame, 0);

		let lit: Vec<f64> = bank
			.owned_nodes()
			.iter()
			.map(|&id| graph.node(id).unwrap().a)
			.collect();
		assert!((lit[0] - 1.0).abs() < 1e-12);
		assert!(lit[1..].iter().all(|&a| a == 0.0));
	}

	#[test]
	fn empty_frame_leaves_every_bucket_at_zero() {
		let mut graph = GraphStore::new(128, 32);
		let mut bank = ByteHistogramBank::new(BucketConfig { buckets: 8 });
		bank.ensure_registered(&mut graph).unwrap();

		bank.observe(&mut graph, &[], 0);

		assert!(bank
			.owned_nodes()
			.iter()
			.all(|&id| graph.node(id).unwrap().a == 0.0));
	}
}
