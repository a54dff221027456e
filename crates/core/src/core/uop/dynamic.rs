//! Dynamic micro-operation records.
//!
//! A `DynamicMicroOp` is one executed instance of a [`MicroOp`] template. It
//! carries what the front end knows about this particular instance (memory
//! address, branch outcome, instruction-cache classification) plus the state
//! the scheduler fills in (sequence numbers, producer dependencies, resolved
//! memory latency).
//!
//! Ownership moves into a ROB slot at insertion and the record is dropped
//! exactly once, when the slot retires.

use std::fmt;
use std::sync::Arc;

use super::hit_where::HitWhere;
use super::micro_op::{MicroOp, PortClass};
use crate::common::{MemAccess, SchedulerError};

/// Maximum number of producers a single micro-op may wait on.
pub const MAX_DEPENDENCIES: usize = 32;

/// Fixed-capacity, duplicate-free list of producer sequence numbers.
///
/// Kept inline so that wiring dependencies never allocates. Insertion order is
/// preserved; store-to-load forwarding relies on finding the first store.
#[derive(Clone, PartialEq, Eq)]
pub struct DependencyList {
    seqs: [u64; MAX_DEPENDENCIES],
    len: usize,
}

impl DependencyList {
    /// An empty list.
    pub const fn new() -> Self {
        Self {
            seqs: [0; MAX_DEPENDENCIES],
            len: 0,
        }
    }

    /// Number of outstanding producers.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when no producer is outstanding.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Outstanding producers in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.seqs[..self.len]
    }

    /// True if `seq` is listed.
    pub fn contains(&self, seq: u64) -> bool {
        self.as_slice().contains(&seq)
    }

    /// Adds `seq` unless already present. Returns `false` when the list is full.
    fn insert(&mut self, seq: u64) -> bool {
        if self.contains(seq) {
            return true;
        }
        if self.len == MAX_DEPENDENCIES {
            return false;
        }
        self.seqs[self.len] = seq;
        self.len += 1;
        true
    }

    /// Removes `seq`, keeping the order of the others. Returns whether it was present.
    fn remove(&mut self, seq: u64) -> bool {
        match self.as_slice().iter().position(|&s| s == seq) {
            Some(pos) => {
                self.seqs.copy_within(pos + 1..self.len, pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }
}

impl Default for DependencyList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DependencyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Resolved control-flow outcome of a branch instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BranchInfo {
    /// Branch was taken.
    pub taken: bool,
    /// The predictor got it wrong.
    pub mispredicted: bool,
    /// Target address.
    pub target: u64,
}

/// Architecture-specific extension of a dynamic micro-op.
///
/// A closed set: the scheduler matches on it instead of downcasting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArchPayload {
    /// No architecture-specific information.
    #[default]
    Generic,
    /// The decoder bound the micro-op to a specific issue port class.
    Ported {
        /// Port class to contend for.
        port: PortClass,
    },
}

/// One dynamic instance of a micro-op.
#[derive(Clone, Debug)]
pub struct DynamicMicroOp {
    uop: Arc<MicroOp>,
    sequence_number: u64,
    instruction_number: u64,
    dependencies: DependencyList,
    exec_latency: u64,
    squashed: bool,
    address: Option<MemAccess>,
    dcache_hit_where: HitWhere,
    icache_hit_where: HitWhere,
    icache_latency: u64,
    branch: Option<BranchInfo>,
    force_long_latency_load: bool,
    payload: ArchPayload,
}

impl DynamicMicroOp {
    /// A fresh instance of `uop` that hit in the instruction cache.
    pub fn new(uop: Arc<MicroOp>) -> Self {
        let exec_latency = u64::from(uop.exec_latency);
        Self {
            uop,
            sequence_number: 0,
            instruction_number: 0,
            dependencies: DependencyList::new(),
            exec_latency,
            squashed: false,
            address: None,
            dcache_hit_where: HitWhere::Unknown,
            icache_hit_where: HitWhere::L1I,
            icache_latency: 0,
            branch: None,
            force_long_latency_load: false,
            payload: ArchPayload::Generic,
        }
    }

    /// Attaches the effective memory address.
    #[must_use]
    pub const fn with_address(mut self, access: MemAccess) -> Self {
        self.address = Some(access);
        self
    }

    /// Attaches the branch outcome.
    #[must_use]
    pub const fn with_branch(mut self, taken: bool, mispredicted: bool, target: u64) -> Self {
        self.branch = Some(BranchInfo {
            taken,
            mispredicted,
            target,
        });
        self
    }

    /// Records where the instruction fetch was satisfied and what it cost.
    #[must_use]
    pub const fn with_icache(mut self, hit_where: HitWhere, latency: u64) -> Self {
        self.icache_hit_where = hit_where;
        self.icache_latency = latency;
        self
    }

    /// Records a data-cache result known in advance; the memory collaborator
    /// is then not consulted at issue.
    #[must_use]
    pub const fn with_dcache(mut self, hit_where: HitWhere, latency: u64) -> Self {
        self.dcache_hit_where = hit_where;
        self.exec_latency = self.exec_latency.saturating_add(latency);
        self
    }

    /// Attaches an architecture-specific payload.
    #[must_use]
    pub const fn with_payload(mut self, payload: ArchPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Counts this load as long-latency regardless of where it hits.
    #[must_use]
    pub const fn with_forced_long_latency(mut self) -> Self {
        self.force_long_latency_load = true;
        self
    }

    /// Marks the instance as squashed (wrong path).
    #[must_use]
    pub const fn squash(mut self) -> Self {
        self.squashed = true;
        self
    }

    /// The static template.
    #[inline]
    pub fn uop(&self) -> &MicroOp {
        &self.uop
    }

    /// Unique, strictly increasing position in the dynamic stream.
    #[inline]
    pub const fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Index of the dynamic instruction this micro-op belongs to.
    #[inline]
    pub const fn instruction_number(&self) -> u64 {
        self.instruction_number
    }

    pub(crate) const fn set_numbers(&mut self, sequence_number: u64, instruction_number: u64) {
        self.sequence_number = sequence_number;
        self.instruction_number = instruction_number;
    }

    /// Outstanding producers.
    #[inline]
    pub const fn dependencies(&self) -> &DependencyList {
        &self.dependencies
    }

    /// Adds a producer, ignoring duplicates and self references.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::TooManyDependencies`] when the fixed bound
    /// would be exceeded.
    pub fn add_dependency(&mut self, producer: u64) -> Result<(), SchedulerError> {
        if producer == self.sequence_number || self.dependencies.insert(producer) {
            Ok(())
        } else {
            Err(SchedulerError::TooManyDependencies {
                seq: self.sequence_number,
                limit: MAX_DEPENDENCIES,
            })
        }
    }

    /// Drops a producer. Returns whether it was listed.
    pub fn remove_dependency(&mut self, producer: u64) -> bool {
        self.dependencies.remove(producer)
    }

    /// Preceding micro-ops of the same instruction this one consumes.
    #[inline]
    pub fn intra_instruction_dependencies(&self) -> u64 {
        u64::from(self.uop.intra_instruction_dependencies)
    }

    /// Execution latency, including memory latency once resolved.
    #[inline]
    pub const fn exec_latency(&self) -> u64 {
        self.exec_latency
    }

    pub(crate) const fn add_exec_latency(&mut self, cycles: u64) {
        self.exec_latency = self.exec_latency.saturating_add(cycles);
    }

    /// Wrong-path instance.
    #[inline]
    pub const fn is_squashed(&self) -> bool {
        self.squashed
    }

    /// Effective memory access, for loads and stores.
    #[inline]
    pub const fn address(&self) -> Option<MemAccess> {
        self.address
    }

    /// Where the data access hit; `Unknown` until issued.
    #[inline]
    pub const fn dcache_hit_where(&self) -> HitWhere {
        self.dcache_hit_where
    }

    pub(crate) const fn set_dcache_hit_where(&mut self, hit_where: HitWhere) {
        self.dcache_hit_where = hit_where;
    }

    /// Where the instruction fetch hit.
    #[inline]
    pub const fn icache_hit_where(&self) -> HitWhere {
        self.icache_hit_where
    }

    /// Front-end stall caused by an instruction-cache miss, in cycles.
    #[inline]
    pub const fn icache_latency(&self) -> u64 {
        self.icache_latency
    }

    /// Branch outcome, for branches.
    #[inline]
    pub const fn branch(&self) -> Option<BranchInfo> {
        self.branch
    }

    /// A branch whose direction or target was mispredicted.
    pub fn is_branch_mispredicted(&self) -> bool {
        self.uop.is_branch() && self.branch.is_some_and(|b| b.mispredicted)
    }

    /// First micro-op of its instruction.
    #[inline]
    pub fn is_first(&self) -> bool {
        self.uop.is_first
    }

    /// Last micro-op of its instruction.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.uop.is_last
    }

    /// A load whose latency the window cannot hide.
    pub fn is_long_latency_load(&self) -> bool {
        self.uop.is_load() && (self.force_long_latency_load || self.dcache_hit_where.is_long_latency())
    }

    /// Architecture-specific payload.
    #[inline]
    pub const fn payload(&self) -> ArchPayload {
        self.payload
    }

    /// Issue port class this instance competes for.
    pub fn port(&self) -> PortClass {
        match self.payload {
            ArchPayload::Ported { port } => port,
            ArchPayload::Generic => self.uop.default_port(),
        }
    }
}
