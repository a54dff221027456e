//! Scheduler and configuration errors.
//!
//! This module defines the two failure classes of the timing core:
//! 1. **Invariant violations:** A front end or collaborator broke its contract
//!    (a sequence number outside the buffer, too many dependencies, a store whose
//!    address resolves after the store itself). Scheduling order can no longer be
//!    trusted, so the run must stop. Each variant names the offending micro-op.
//! 2. **Configuration errors:** Invalid or unparsable configuration.
//! 3. **Trace errors:** Unreadable or malformed micro-op trace files.
//!
//! Backpressure (full reservation stations, queues or window) is never an error;
//! it only shows up as delayed progress.

use thiserror::Error;

use super::time::Cycle;

/// Fatal scheduler invariant violation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A sequence number does not fall inside the current buffer range.
    #[error("sequence number {seq} outside of ROB (front {front}, {len} entries)")]
    SequenceOutOfRange {
        /// Offending sequence number.
        seq: u64,
        /// Sequence number at the front of the buffer.
        front: u64,
        /// Number of occupied slots.
        len: usize,
    },

    /// The slot computed by subtraction holds a different micro-op.
    #[error("sequence number {seq} unexpectedly not at ROB position {position} (found {found})")]
    SequenceMismatch {
        /// Requested sequence number.
        seq: u64,
        /// Position derived from the front of the buffer.
        position: usize,
        /// Sequence number actually stored there.
        found: u64,
    },

    /// A micro-op would exceed the fixed dependency bound.
    #[error("micro-op {seq}: more than {limit} dependencies")]
    TooManyDependencies {
        /// Offending micro-op.
        seq: u64,
        /// The fixed bound.
        limit: usize,
    },

    /// A store's address became ready after the store itself.
    #[error("{seq}: store address cannot be ready ({address_ready}) later than the whole micro-op ({ready})")]
    StoreAddressAfterReady {
        /// Offending store.
        seq: u64,
        /// Address-ready time.
        address_ready: Cycle,
        /// Operation-ready time.
        ready: Cycle,
    },

    /// No slot could be freed for a new micro-op.
    #[error("ROB full ({capacity} slots) while inserting {seq}")]
    RobOverflow {
        /// Micro-op being inserted.
        seq: u64,
        /// Ring capacity.
        capacity: usize,
    },

    /// A registered dependant no longer waits on its producer.
    #[error("{dependant} is a dependant of {producer} but has no outstanding dependencies")]
    DanglingDependant {
        /// Producer being issued.
        producer: u64,
        /// Dependant that was notified.
        dependant: u64,
    },
}

/// Invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A size or width that must be positive is zero.
    #[error("{field} must be non-zero")]
    Zero {
        /// Dotted path of the field.
        field: &'static str,
    },

    /// The pre-dispatch staging area cannot hold two dispatch groups.
    #[error("staging_margin ({margin}) must be at least twice dispatch_width ({dispatch_width})")]
    StagingMargin {
        /// Configured margin.
        margin: usize,
        /// Configured dispatch width.
        dispatch_width: usize,
    },

    /// The JSON document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to read a micro-op trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace could not be read.
    #[error("cannot read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A record is not valid JSON or does not describe a micro-op.
    #[error("trace line {line}: {source}")]
    Record {
        /// 1-based line number.
        line: usize,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Failure of a multi-core run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration was rejected before any engine was built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One core hit a scheduler invariant violation.
    #[error("core {core}: {source}")]
    Core {
        /// Index of the failing core.
        core: usize,
        /// Violation reported by its engine.
        source: SchedulerError,
    },
}
