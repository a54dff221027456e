//! Common types shared by every part of the timing core.
//!
//! This module provides:
//! 1. **Time:** The `Cycle` timestamp with its "not yet known" sentinel.
//! 2. **Operands:** Register identifiers and memory access descriptors.
//! 3. **Errors:** Scheduler invariant violations, configuration and trace errors.

/// Memory operand descriptors.
pub mod addr;

/// Scheduler and configuration error types.
pub mod error;

/// Architectural register identifiers.
pub mod reg;

/// Simulated time in cycles.
pub mod time;

pub use addr::{MemAccess, VirtAddr};
pub use error::{ConfigError, RunError, SchedulerError, TraceError};
pub use reg::RegId;
pub use time::Cycle;
