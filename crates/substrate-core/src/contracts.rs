//! External-collaborator contracts (§6).
//!
//! The core substrate never depends on a concrete detector bank, macro
//! library, or transport; it depends only on these traits. `substrate-core`
//! ships one reference implementation of the channel contract
//! ([`RingChannel`]) so the crate is runnable standalone; reference
//! detector/macro implementations live in the sibling `substrate-detectors`
//! and `substrate-macros` crates.

use crate::graph::GraphStore;
use crate::node::NodeId;

/// Smoothing factor for a macro's fast utility track.
pub const MACRO_FAST_DECAY: f64 = 0.95;
/// Smoothing factor for a macro's slow utility track.
pub const MACRO_SLOW_DECAY: f64 = 0.999;
/// Blend factor between the two utility tracks when ranking macros.
pub const MACRO_GAMMA_SLOW: f64 = 0.8;

/// Writes sensory node activations from the current input frame.
///
/// Implementors own a fixed set of node ids (their designated sensory
/// nodes) and must uphold three rules every tick: (i) never write to a
/// node outside that set, (ii) set each owned node's activation directly
/// rather than letting it fall out of propagation, since a sensory node
/// has no incoming edges and [`crate::propagate`] leaves such source
/// nodes untouched, and (iii) treat `activation > 0.5` as the node
/// "firing" for the purposes of `last_tick_seen`/`burst`/`sig_history`
/// bookkeeping.
pub trait SensoryBank {
	/// Node ids this bank owns and writes to.
	fn owned_nodes(&self) -> &[NodeId];

	/// Register this bank's sensory nodes in `graph` if they do not exist
	/// yet. Called once at startup or when the bank is first attached.
	fn ensure_registered(&mut self, graph: &mut GraphStore) -> crate::error::Result<()>;

	/// Update every owned node's activation from `frame`.
	fn observe(&mut self, graph: &mut GraphStore, frame: &[u8], tick: u64);
}

/// One macro: a byte payload the output channel emits verbatim, plus the
/// bookkeeping the core needs to run ε-greedy selection over it.
#[derive(Clone, Debug, Default)]
pub struct MacroStats {
	/// Fast exponential moving average of `1 - mean_error` reward.
	pub u_fast: f64,
	/// Slow exponential moving average of the same reward.
	pub u_slow: f64,
	/// Times this macro has been selected.
	pub use_count: u64,
	/// Tick this macro was last selected.
	pub last_used_tick: u64,
}

impl MacroStats {
	/// Blended utility the core ranks macros by:
	/// `γ_slow·U_slow + (1−γ_slow)·U_fast`.
	#[must_use]
	pub fn blended(&self) -> f64 {
		MACRO_GAMMA_SLOW.mul_add(self.u_slow, (1.0 - MACRO_GAMMA_SLOW) * self.u_fast)
	}

	/// Fold in one tick's reward, updating both utility tracks, the use
	/// count, and the last-used tick.
	pub fn record_outcome(&mut self, reward: f64, tick: u64) {
		self.u_fast = MACRO_FAST_DECAY.mul_add(self.u_fast, (1.0 - MACRO_FAST_DECAY) * reward);
		self.u_slow = MACRO_SLOW_DECAY.mul_add(self.u_slow, (1.0 - MACRO_SLOW_DECAY) * reward);
		self.use_count += 1;
		self.last_used_tick = tick;
	}
}

/// An indexable set of up to `macro_cap` macros the core selects from
/// every tick (§6's macro library contract).
pub trait MacroLibrary {
	/// Number of macros currently registered.
	fn len(&self) -> usize;

	/// Whether no macros are registered.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Byte payload for the macro at `index` (0–256 bytes).
	fn payload(&self, index: usize) -> &[u8];

	/// Current utility statistics for the macro at `index`.
	fn stats(&self, index: usize) -> &MacroStats;

	/// Record the outcome of having selected the macro at `index` this
	/// tick, updating its utility tracks per [`MacroStats::record_outcome`].
	fn record_outcome(&mut self, index: usize, reward: f64, tick: u64);
}

/// Supplies the raw byte frame the detector bank reads from each tick.
pub trait InputSource {
	/// Fill `buf` with up to `buf.len()` bytes, returning how many were
	/// written. Returning `0` is a valid "no input this tick" response.
	fn read_frame(&mut self, buf: &mut [u8]) -> usize;
}

/// Receives the byte sequence emitted by the selected macro each tick.
pub trait OutputSink {
	/// Consume the selected macro's payload for this tick.
	fn write_frame(&mut self, bytes: &[u8]);
}

/// Minimal in-memory ring buffer implementing both [`InputSource`] (by
/// draining) and [`OutputSink`] (by appending), the way `visual.rs` and
/// `location.rs` lean on a plain `Vec`-backed ring rather than a crate for
/// small bounded self-observation buffers.
#[derive(Debug, Clone)]
pub struct RingChannel {
	buf: Vec<u8>,
	capacity: usize,
}

impl RingChannel {
	/// Create an empty ring with the given capacity.
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		Self {
			buf: Vec::with_capacity(capacity),
			capacity,
		}
	}

	/// Current number of buffered bytes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.buf.len()
	}

	/// Whether the ring currently holds no bytes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}
}

impl InputSource for RingChannel {
	fn read_frame(&mut self, buf: &mut [u8]) -> usize {
		let n = buf.len().min(self.buf.len());
		let drained: Vec<u8> = self.buf.drain(..n).collect();
		buf[..n].copy_from_slice(&drained);
		n
	}
}

impl OutputSink for RingChannel {
	fn write_frame(&mut self, bytes: &[u8]) {
		self.buf.extend_from_slice(bytes);
		if self.buf.len() > self.capacity {
			let overflow = self.buf.len() - self.capacity;
			self.buf.drain(..overflow);
		}
	}
}
