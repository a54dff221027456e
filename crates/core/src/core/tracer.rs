//! Retirement tracing.
//!
//! Every committing micro-op is reported, in order, to an [`InstructionTracer`]
//! with its dispatch, issue, done and commit cycles.

use std::sync::{Arc, Mutex, PoisonError};

use crate::common::Cycle;
use crate::core::uop::DynamicMicroOp;

/// Lifecycle timestamps of a retiring micro-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UopTimes {
    /// Entered the window.
    pub dispatched: Cycle,
    /// Began execution.
    pub issued: Cycle,
    /// Eligible to commit.
    pub done: Cycle,
    /// Retired.
    pub commit: Cycle,
}

/// Receives retirement events.
pub trait InstructionTracer: Send {
    /// Called once per micro-op, in commit order, before it is freed.
    fn trace_instruction(&mut self, uop: &DynamicMicroOp, times: &UopTimes);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl InstructionTracer for NullTracer {
    fn trace_instruction(&mut self, _uop: &DynamicMicroOp, _times: &UopTimes) {}
}

/// One retirement as seen by [`RecordingTracer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitRecord {
    /// Sequence number.
    pub seq: u64,
    /// Instruction number.
    pub instruction_number: u64,
    /// Closed an instruction.
    pub is_last: bool,
    /// Lifecycle timestamps.
    pub times: UopTimes,
}

/// Collects retirements into a shared log; clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingTracer {
    log: Arc<Mutex<Vec<CommitRecord>>>,
}

impl RecordingTracer {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything retired so far.
    pub fn records(&self) -> Vec<CommitRecord> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl InstructionTracer for RecordingTracer {
    fn trace_instruction(&mut self, uop: &DynamicMicroOp, times: &UopTimes) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CommitRecord {
                seq: uop.sequence_number(),
                instruction_number: uop.instruction_number(),
                is_last: uop.is_last(),
                times: *times,
            });
    }
}
