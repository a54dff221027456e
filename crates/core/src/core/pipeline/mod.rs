//! Reorder-buffer scheduling pipeline.
//!
//! This module contains the out-of-order timing model proper.
//! It includes the following components:
//! 1. **ROB:** Circular buffer of in-flight micro-ops addressed by sequence number.
//! 2. **Dependants:** Inline-then-overflow consumer lists kept per ROB slot.
//! 3. **Queues:** Load/store queue admission models.
//! 4. **Contention:** Issue-port admission collaborator.
//! 5. **Engine:** Dispatch, issue and commit driven by a skip-ahead clock.

/// Issue-port contention trait and default port model.
pub mod contention;

/// Consumer lists with inline storage.
pub mod dependants;

/// The scheduling engine (insert, dispatch, issue, commit, clock).
pub mod engine;

/// Outstanding load/store slot tracking.
pub mod queue;

/// Reorder buffer and its entries.
pub mod rob;

pub use self::engine::{RobEngine, SimulateOutcome};
