//! Outstanding load/store admission.
//!
//! A `ContentionQueue` models a fixed number of slots (load queue or store
//! queue entries). Each slot remembers when it becomes free again. The
//! scheduler asks two questions:
//! 1. **Admission:** Is any slot free at `now`?
//! 2. **Occupancy:** Given an access of `latency` cycles starting no earlier
//!    than `now`, when does it complete? The chosen slot is held until then.

use crate::common::Cycle;

/// Fixed-size pool of slots, each busy until a known cycle.
#[derive(Clone, Debug)]
pub struct ContentionQueue {
    free_at: Vec<Cycle>,
}

impl ContentionQueue {
    /// Creates a queue with `slots` entries, all free.
    pub fn new(slots: usize) -> Self {
        Self {
            free_at: vec![Cycle::ZERO; slots],
        }
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.free_at.len()
    }

    /// True if some slot is free at `now`.
    pub fn has_free_slot(&self, now: Cycle) -> bool {
        self.free_at.iter().any(|&t| t <= now)
    }

    /// Slots still occupied at `now`.
    pub fn occupied(&self, now: Cycle) -> usize {
        self.free_at.iter().filter(|&&t| t > now).count()
    }

    /// Books the earliest-free slot for `latency` cycles starting at or after
    /// `now` and returns the completion time.
    pub fn get_completion_time(&mut self, now: Cycle, latency: u64) -> Cycle {
        let Some(slot) = self
            .free_at
            .iter_mut()
            .min_by_key(|t| **t)
        else {
            return now + latency;
        };
        let start = (*slot).max(now);
        *slot = start + latency;
        *slot
    }
}
