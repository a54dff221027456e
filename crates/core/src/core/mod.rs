//! Timing core implementation.
//!
//! This module contains the reorder-buffer scheduler together with the
//! collaborator interfaces it consults: dependency resolution, the memory
//! hierarchy and retirement tracing.

/// Register and memory dependency resolution.
pub mod deps;

/// Memory access collaborator and light cache models.
pub mod memory;

/// Reorder-buffer scheduling pipeline.
pub mod pipeline;

/// Retirement tracing.
pub mod tracer;

/// Micro-op templates and dynamic instances.
pub mod uop;

pub use self::pipeline::{RobEngine, SimulateOutcome};
