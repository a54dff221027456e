//! Register and memory dependency resolution.
//!
//! The scheduler does not decide who produces a value; it asks these
//! collaborators for producer sequence numbers at insertion time. Any producer
//! older than the low-water mark (`lowest`, the oldest sequence number still in
//! the ROB) has already committed and is ignored.
//!
//! Defaults:
//! 1. **[`RegisterDependencyTracker`]:** Last-writer table indexed by register.
//! 2. **[`MemoryDependencyTracker`]:** Loads wait for the last in-flight store to the same address.

use std::collections::HashMap;

use crate::common::{RegId, SchedulerError};
use crate::core::uop::DynamicMicroOp;

/// Register producer lookup.
pub trait RegisterDependencies: Send {
    /// In-flight producer of `reg`, if it is not older than `lowest`.
    fn peek_producer(&self, reg: RegId, lowest: u64) -> Option<u64>;

    /// Adds `uop`'s register producers to its dependency list and records it as
    /// the new writer of its destination registers.
    ///
    /// # Errors
    ///
    /// Propagates [`SchedulerError::TooManyDependencies`].
    fn set_dependencies(&mut self, uop: &mut DynamicMicroOp, lowest: u64) -> Result<(), SchedulerError>;
}

/// Memory producer lookup.
pub trait MemoryDependencies: Send {
    /// Adds `uop`'s memory producers to its dependency list and records it if
    /// it is a store.
    ///
    /// # Errors
    ///
    /// Propagates [`SchedulerError::TooManyDependencies`].
    fn set_dependencies(&mut self, uop: &mut DynamicMicroOp, lowest: u64) -> Result<(), SchedulerError>;
}

/// Last-writer table.
#[derive(Clone, Debug, Default)]
pub struct RegisterDependencyTracker {
    producers: Vec<Option<u64>>,
}

impl RegisterDependencyTracker {
    /// An empty table; grows on demand.
    pub fn new() -> Self {
        Self::default()
    }

    fn producer(&self, reg: RegId) -> Option<u64> {
        self.producers.get(reg.index()).copied().flatten()
    }
}

impl RegisterDependencies for RegisterDependencyTracker {
    fn peek_producer(&self, reg: RegId, lowest: u64) -> Option<u64> {
        self.producer(reg).filter(|&seq| seq >= lowest)
    }

    fn set_dependencies(&mut self, uop: &mut DynamicMicroOp, lowest: u64) -> Result<(), SchedulerError> {
        let seq = uop.sequence_number();

        // Earlier micro-ops of the same instruction.
        for back in 1..=uop.intra_instruction_dependencies() {
            if let Some(producer) = seq.checked_sub(back).filter(|&p| p >= lowest) {
                uop.add_dependency(producer)?;
            }
        }

        let template = uop.uop();
        let reads: Vec<u64> = template
            .source_registers
            .iter()
            .chain(&template.address_registers)
            .filter_map(|&reg| self.peek_producer(reg, lowest))
            .collect();
        let writes: Vec<RegId> = template.destination_registers.clone();

        for producer in reads {
            uop.add_dependency(producer)?;
        }
        for reg in writes {
            let idx = reg.index();
            if idx >= self.producers.len() {
                self.producers.resize(idx + 1, None);
            }
            self.producers[idx] = Some(seq);
        }
        Ok(())
    }
}

/// Store-address table.
#[derive(Clone, Debug, Default)]
pub struct MemoryDependencyTracker {
    last_store: HashMap<u64, u64>,
}

/// Prune the table once it grows past this many addresses.
const PRUNE_THRESHOLD: usize = 4096;

impl MemoryDependencyTracker {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses currently tracked.
    pub fn len(&self) -> usize {
        self.last_store.len()
    }

    /// True if no store is tracked.
    pub fn is_empty(&self) -> bool {
        self.last_store.is_empty()
    }
}

impl MemoryDependencies for MemoryDependencyTracker {
    fn set_dependencies(&mut self, uop: &mut DynamicMicroOp, lowest: u64) -> Result<(), SchedulerError> {
        let Some(access) = uop.address() else {
            return Ok(());
        };
        let addr = access.address.val();

        if uop.uop().is_load() {
            if let Some(store) = self.last_store.get(&addr).copied().filter(|&s| s >= lowest) {
                uop.add_dependency(store)?;
            }
        } else if uop.uop().is_store() {
            if self.last_store.len() >= PRUNE_THRESHOLD {
                self.last_store.retain(|_, &mut seq| seq >= lowest);
            }
            let _ = self.last_store.insert(addr, uop.sequence_number());
        }
        Ok(())
    }
}
