//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB is a circular buffer that owns every in-flight micro-op from
//! insertion through commit. It provides:
//! 1. **Allocation:** Appends entries at the tail in sequence-number order.
//! 2. **Lookup:** Finds an entry by sequence number in constant time (position = seq - front seq).
//! 3. **In-order Commit:** Retires entries from the head only.
//!
//! Because entries are contiguous in sequence number and only leave from the
//! front, a sequence number outside the occupied range is a detectable error
//! rather than a stale reference.

use std::fmt;

use crate::common::{Cycle, SchedulerError};
use crate::core::pipeline::dependants::Dependants;
use crate::core::uop::DynamicMicroOp;

/// Scheduling state of one in-flight micro-op.
pub struct RobEntry {
    uop: DynamicMicroOp,
    /// Cycle the entry entered the active window.
    pub dispatched: Cycle,
    /// Cycle all operands are available.
    pub ready: Cycle,
    /// Latest operand-availability time seen so far.
    pub ready_max: Cycle,
    /// Cycle the store address is known (stores only).
    pub address_ready: Cycle,
    /// Latest address-operand availability seen so far.
    pub address_ready_max: Cycle,
    /// Cycle the micro-op issued.
    pub issued: Cycle,
    /// Cycle the micro-op may commit.
    pub done: Cycle,
    dependants: Dependants,
    address_producers: Vec<u64>,
}

impl RobEntry {
    /// Wraps a micro-op with every timestamp unset.
    pub fn new(uop: DynamicMicroOp) -> Self {
        Self {
            uop,
            dispatched: Cycle::INFINITE,
            ready: Cycle::INFINITE,
            ready_max: Cycle::ZERO,
            address_ready: Cycle::INFINITE,
            address_ready_max: Cycle::ZERO,
            issued: Cycle::INFINITE,
            done: Cycle::INFINITE,
            dependants: Dependants::default(),
            address_producers: Vec::new(),
        }
    }

    /// The owned micro-op.
    #[inline]
    pub const fn uop(&self) -> &DynamicMicroOp {
        &self.uop
    }

    #[inline]
    pub(crate) const fn uop_mut(&mut self) -> &mut DynamicMicroOp {
        &mut self.uop
    }

    /// Sequence number of the owned micro-op.
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.uop.sequence_number()
    }

    /// True once issue has scheduled completion.
    #[inline]
    pub const fn is_done_set(&self) -> bool {
        !self.done.is_infinite()
    }

    /// Consumers waiting on this entry.
    #[inline]
    pub const fn dependants(&self) -> &Dependants {
        &self.dependants
    }

    pub(crate) fn add_dependant(&mut self, seq: u64) {
        self.dependants.push(seq);
    }

    /// In-flight producers of this store's address.
    #[inline]
    pub fn address_producers(&self) -> &[u64] {
        &self.address_producers
    }

    pub(crate) fn add_address_producer(&mut self, seq: u64) {
        if !self.address_producers.contains(&seq) {
            self.address_producers.push(seq);
        }
    }

    /// Releases the owned micro-op.
    pub fn into_uop(self) -> DynamicMicroOp {
        self.uop
    }
}

impl fmt::Debug for RobEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobEntry")
            .field("seq", &self.seq())
            .field("dispatched", &self.dispatched)
            .field("ready", &self.ready)
            .field("ready_max", &self.ready_max)
            .field("address_ready", &self.address_ready)
            .field("issued", &self.issued)
            .field("done", &self.done)
            .field("deps", self.uop.dependencies())
            .field("dependants", &self.dependants.len())
            .finish()
    }
}

/// Reorder Buffer: circular buffer for in-order commit.
#[derive(Debug)]
pub struct Rob {
    /// Fixed-size slot array.
    slots: Vec<Option<RobEntry>>,
    /// Index of the oldest entry (commit point).
    head: usize,
    /// Index where the next entry will be placed.
    tail: usize,
    /// Number of occupied slots.
    count: usize,
}

impl Rob {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    /// Appends an entry at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::RobOverflow`] if every slot is occupied.
    pub fn push_back(&mut self, entry: RobEntry) -> Result<(), SchedulerError> {
        if self.is_full() {
            return Err(SchedulerError::RobOverflow {
                seq: entry.seq(),
                capacity: self.capacity(),
            });
        }
        self.slots[self.tail] = Some(entry);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        Ok(())
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<RobEntry> {
        if self.count == 0 {
            return None;
        }
        let entry = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        entry
    }

    /// Returns the oldest entry.
    pub fn front(&self) -> Option<&RobEntry> {
        self.get(0)
    }

    /// Sequence number of the oldest entry.
    pub fn front_seq(&self) -> Option<u64> {
        self.front().map(RobEntry::seq)
    }

    /// Entry at `pos` positions behind the head.
    pub fn get(&self, pos: usize) -> Option<&RobEntry> {
        if pos >= self.count {
            return None;
        }
        self.slots[(self.head + pos) % self.slots.len()].as_ref()
    }

    /// Mutable entry at `pos` positions behind the head.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut RobEntry> {
        if pos >= self.count {
            return None;
        }
        let idx = (self.head + pos) % self.slots.len();
        self.slots[idx].as_mut()
    }

    /// Position of `seq` relative to the head.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::SequenceOutOfRange`] if `seq` is not between
    /// the front and back sequence numbers, and
    /// [`SchedulerError::SequenceMismatch`] if the computed slot holds a
    /// different micro-op.
    pub fn position_of(&self, seq: u64) -> Result<usize, SchedulerError> {
        let front = self.front_seq().unwrap_or(0);
        let out_of_range = || SchedulerError::SequenceOutOfRange {
            seq,
            front,
            len: self.count,
        };
        let offset = seq.checked_sub(front).ok_or_else(out_of_range)?;
        let pos = usize::try_from(offset).map_err(|_| out_of_range())?;
        let entry = self.get(pos).ok_or_else(out_of_range)?;
        if entry.seq() == seq {
            Ok(pos)
        } else {
            Err(SchedulerError::SequenceMismatch {
                seq,
                position: pos,
                found: entry.seq(),
            })
        }
    }

    /// Finds the entry holding `seq`.
    ///
    /// # Errors
    ///
    /// See [`Rob::position_of`].
    pub fn find(&self, seq: u64) -> Result<&RobEntry, SchedulerError> {
        let pos = self.position_of(seq)?;
        self.get(pos).ok_or(SchedulerError::SequenceOutOfRange {
            seq,
            front: self.front_seq().unwrap_or(0),
            len: self.count,
        })
    }

    /// Finds the entry holding `seq`, mutably.
    ///
    /// # Errors
    ///
    /// See [`Rob::position_of`].
    pub fn find_mut(&mut self, seq: u64) -> Result<&mut RobEntry, SchedulerError> {
        let pos = self.position_of(seq)?;
        let front = self.front_seq().unwrap_or(0);
        let len = self.count;
        self.get_mut(pos)
            .ok_or(SchedulerError::SequenceOutOfRange { seq, front, len })
    }

    /// Iterates entries from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &RobEntry> + '_ {
        (0..self.count).filter_map(move |pos| self.get(pos))
    }
}
