//! Consumer lists for in-flight producers.
//!
//! Most micro-ops feed only a handful of consumers, so the first
//! [`INLINE_DEPENDANTS`] sequence numbers are stored in the slot itself and only
//! wide fan-out spills into a heap vector. Entries refer to consumers by
//! sequence number; the ROB resolves them back to slots.

/// Consumers stored without allocating.
pub const INLINE_DEPENDANTS: usize = 8;

/// Inline-then-overflow list of consumer sequence numbers.
#[derive(Clone, Debug, Default)]
pub struct Dependants {
    inline: [u64; INLINE_DEPENDANTS],
    inline_len: usize,
    overflow: Vec<u64>,
}

impl Dependants {
    /// Appends a consumer.
    pub fn push(&mut self, seq: u64) {
        if self.inline_len < INLINE_DEPENDANTS {
            self.inline[self.inline_len] = seq;
            self.inline_len += 1;
        } else {
            self.overflow.push(seq);
        }
    }

    /// Number of consumers.
    #[inline]
    pub fn len(&self) -> usize {
        self.inline_len + self.overflow.len()
    }

    /// True when nothing consumes this producer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inline_len == 0
    }

    /// True once the inline capacity has been exceeded.
    #[inline]
    pub fn spilled(&self) -> bool {
        !self.overflow.is_empty()
    }

    /// Consumers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.inline[..self.inline_len]
            .iter()
            .chain(self.overflow.iter())
            .copied()
    }

    /// Consumer at `idx`, in registration order.
    pub fn get(&self, idx: usize) -> Option<u64> {
        if idx < self.inline_len {
            Some(self.inline[idx])
        } else {
            self.overflow.get(idx - INLINE_DEPENDANTS).copied()
        }
    }
}
