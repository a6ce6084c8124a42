//! Error types for the substrate.
//!
//! All failures inside a running tick are local and non-fatal (§7): the
//! caller sees them only as statistics counters. The one fatal path is
//! configuration validation at startup.

/// Errors the substrate can report.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
	/// The node or edge arena is full; the caller's growth operation was
	/// skipped, not reverted into a panic.
	#[error("{kind} arena at capacity ({live}/{cap})")]
	CapacityExhausted {
		/// Which arena overflowed.
		kind: ArenaKind,
		/// Live entity count at the time of the failed allocation.
		live: u32,
		/// Configured capacity.
		cap: u32,
	},

	/// A snapshot write or read failed; the tick continues and the next
	/// snapshot is retried.
	#[error("persistence failure: {0}")]
	PersistenceFailed(String),

	/// A configuration value is invalid; this is fatal at startup.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// A control parameter left its clamp interval or a quantity that must
	/// stay finite and positive (e.g. `activation_scale`) did not; this
	/// should be unreachable given the controller's clamps and, if it is
	/// ever observed, the current tick aborts defensively.
	#[error("numerical degeneracy: {0}")]
	NumericalDegeneracy(String),
}

/// Which arena a capacity failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaKind {
	/// The node arena.
	Node,
	/// The edge arena.
	Edge,
}

impl std::fmt::Display for ArenaKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Node => write!(f, "node"),
			Self::Edge => write!(f, "edge"),
		}
	}
}

impl SubstrateError {
	/// Whether this error is a local, per-tick skip rather than a fatal
	/// startup failure.
	#[must_use]
	pub fn is_recoverable(&self) -> bool {
		!matches!(self, Self::InvalidConfig(_))
	}
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SubstrateError>;
