//! The substrate's single named random stream.
//!
//! Every probabilistic decision in growth, pruning, and slow-weight
//! consolidation draws from one [`Rng`] instance threaded through the tick
//! driver, per the design note that randomness should never be scattered
//! across ad hoc `rand::thread_rng()` calls.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

/// Seeded uniform-float source used throughout the substrate.
///
/// Wraps `SmallRng` (non-cryptographic, fast) rather than a CSPRNG: the
/// spec makes no cryptographic guarantees and explicitly does not require
/// cross-platform determinism, only an explicit, documented seed.
#[derive(Debug, Clone)]
pub struct Rng {
	inner: SmallRng,
}

impl Rng {
	/// Create a stream seeded from a fixed 64-bit value. Two `Rng`s built
	/// from the same seed draw the same sequence on the same build.
	#[must_use]
	pub fn from_seed(seed: u64) -> Self {
		Self {
			inner: SmallRng::seed_from_u64(seed),
		}
	}

	/// Seed from the OS entropy source. Use when run-to-run reproducibility
	/// is not required.
	#[must_use]
	pub fn from_entropy() -> Self {
		Self {
			inner: SmallRng::from_entropy(),
		}
	}

	/// Draw a uniform float in `[0, 1)`.
	#[inline]
	pub fn uniform(&mut self) -> f64 {
		self.inner.gen::<f64>()
	}

	/// Roll a weighted coin: `true` with probability `p` (clamped to
	/// `[0, 1]`).
	#[inline]
	pub fn chance(&mut self, p: f64) -> bool {
		self.uniform() < p.clamp(0.0, 1.0)
	}

	/// Draw a uniform integer in `[0, bound)`. Returns `0` if `bound == 0`.
	#[inline]
	pub fn below(&mut self, bound: usize) -> usize {
		if bound == 0 {
			return 0;
		}
		self.inner.gen_range(0..bound)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_seed_same_sequence() {
		let mut a = Rng::from_seed(42);
		let mut b = Rng::from_seed(42);
		for _ in 0..64 {
			assert_eq!(a.uniform(), b.uniform());
		}
	}

	#[test]
	fn uniform_is_in_unit_interval() {
		let mut r = Rng::from_seed(1);
		for _ in 0..1000 {
			let x = r.uniform();
			assert!((0.0..1.0).contains(&x));
		}
	}

	#[test]
	fn chance_respects_extremes() {
		let mut r = Rng::from_seed(2);
		assert!(!r.chance(0.0));
		assert!(r.chance(1.0));
	}
}
