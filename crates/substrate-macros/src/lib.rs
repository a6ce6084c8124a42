//! Reference macro library: a fixed table of byte-payload macros.
//!
//! A plain `Vec`-backed state pattern: a bounded collection of small
//! records, each carrying its own decayed statistics, rather than anything
//! fancier. The contract only asks for indexable payloads and per-index
//! utility bookkeeping.

#![warn(missing_docs)]
#![warn(clippy::all)]

use substrate_core::{MacroLibrary, MacroStats};

/// Maximum payload length for a single macro (§6: "0-256 bytes").
pub const MAX_PAYLOAD_LEN: usize = 256;

/// One registered macro: its emitted payload plus its running statistics.
#[derive(Clone, Debug, Default)]
struct MacroEntry {
	payload: Vec<u8>,
	stats: MacroStats,
}

/// A capacity-bounded table of macros, indexed `0..len()`.
///
/// Registration order is preserved and indices are never reused once
/// assigned within a table's lifetime (no free list: macros are added at
/// startup and left in place, unlike the graph's node/edge arenas).
#[derive(Debug, Default)]
pub struct TableMacroLibrary {
	cap: usize,
	entries: Vec<MacroEntry>,
}

impl TableMacroLibrary {
	/// Build an empty table that will refuse registrations past `cap`.
	#[must_use]
	pub fn new(cap: usize) -> Self {
		Self {
			cap,
			entries: Vec::new(),
		}
	}

	/// Register a macro's payload, truncating to [`MAX_PAYLOAD_LEN`] bytes.
	///
	/// Returns the new macro's index, or `None` if the table is already at
	/// capacity.
	pub fn register(&mut self, mut payload: Vec<u8>) -> Option<usize> {
		if self.entries.len() >= self.cap {
			return None;
		}
		payload.truncate(MAX_PAYLOAD_LEN);
		self.entries.push(MacroEntry {
			payload,
			stats: MacroStats::default(),
		});
		Some(self.entries.len() - 1)
	}
}

impl MacroLibrary for TableMacroLibrary {
	fn len(&self) -> usize {
		self.entries.len()
	}

	fn payload(&self, index: usize) -> &[u8] {
		self.entries
			.get(index)
			.map_or(&[][..], |e| e.payload.as_slice())
	}

	fn stats(&self, index: usize) -> &MacroStats {
		&self.entries[index].stats
	}

	fn record_outcome(&mut self, index: usize, reward: f64, tick: u64) {
		if let Some(entry) = self.entries.get_mut(index) {
			entry.stats.record_outcome(reward, tick);
		}
	}
}
