//! Reorder-buffer timing core.
//!
//! This crate models the timing of an out-of-order superscalar core fed with
//! already-decoded micro-ops, with the following:
//! 1. **Core:** The reorder-buffer scheduler (dispatch, issue, in-order commit)
//!    driven by a skip-ahead clock, plus its collaborator traits.
//! 2. **Dependencies:** Register and memory producer tracking, store-to-load
//!    forwarding and address disambiguation.
//! 3. **Memory:** Latency models consulted once per load or store.
//! 4. **Simulation:** Trace loading and parallel multi-core replay.
//! 5. **Statistics:** CPI stack, micro-op mix and memory-level parallelism.

/// Common types (cycles, registers, memory operands, errors).
pub mod common;
/// Scheduler configuration (defaults, validation, JSON loading).
pub mod config;
/// Timing core (micro-ops, ROB engine, collaborators).
pub mod core;
/// Trace loader and multi-core replay.
pub mod sim;
/// Scheduler statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// The scheduling engine and the result of advancing it.
pub use crate::core::{RobEngine, SimulateOutcome};
/// Per-engine metrics.
pub use crate::stats::RobStats;
