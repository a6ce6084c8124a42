//! # substrate-core
//!
//! An always-on, single-process cognitive substrate: a typed directed
//! multigraph over which a tight perceive → predict → learn → act loop
//! runs every tick, nudged toward stability by a homeostatic controller
//! rather than by hand-tuned constants.
//!
//! ## Tick loop
//!
//! Each call to [`driver::TickDriver::step`] runs, in order:
//!
//! 1. **Perceive** — the detector bank ([`contracts::SensoryBank`]) writes
//!    this tick's sensory node activations from the input frame.
//! 2. **Converge** — [`convergence::converge`] runs repeated
//!    [`propagate::propagate`] hops until the graph's activation pattern
//!    settles or a hard hop cap is hit.
//! 3. **Learn** — [`learning::learn`] scores every edge's usefulness this
//!    tick and folds it into the fast weight immediately, the slow weight
//!    on a per-edge probabilistic schedule.
//! 4. **Homeostasis** — every 10 ticks, [`homeostat::HomeostaticController`]
//!    nudges the 14 control parameters from recent measurements.
//! 5. **Growth / prune** — [`growth::grow`] and [`prune::prune`] create and
//!    remove edges and nodes, every decision a single probability roll.
//! 6. **Act** — an ε-greedy macro is selected from the
//!    [`contracts::MacroLibrary`] and its bytes are emitted.
//! 7. **Snapshot** — every `snapshot_period` ticks, [`persistence::save`]
//!    writes the graph to disk.
//!
//! Sensory detectors and the macro library are external collaborators:
//! this crate depends only on their trait contracts
//! ([`contracts::SensoryBank`], [`contracts::MacroLibrary`]), not on any
//! particular implementation of either.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::needless_return)]

pub mod config;
pub mod contracts;
pub mod convergence;
pub mod driver;
pub mod edge;
pub mod error;
pub mod graph;
pub mod growth;
pub mod homeostat;
pub mod learning;
pub mod node;
pub mod persistence;
pub mod prune;
pub mod propagate;
pub mod rng;
pub mod stats;

pub use config::{ControlParams, SubstrateConfig};
pub use contracts::{InputSource, MacroLibrary, MacroStats, OutputSink, RingChannel, SensoryBank};
pub use convergence::{converge, ConvergenceOutcome};
pub use driver::TickDriver;
pub use edge::{Edge, EdgeId};
pub use error::{SubstrateError, Result};
pub use graph::GraphStore;
pub use growth::{grow, GrowthOutcome};
pub use homeostat::{HomeostatInputs, HomeostaticController};
pub use learning::{learn, LearningOutcome, LearningState};
pub use node::{Node, NodeId};
pub use prune::{prune, PruneOutcome};
pub use propagate::{propagate, PropagationOutcome};
pub use rng::Rng;
pub use stats::TickStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
