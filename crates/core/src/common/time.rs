//! Simulated time.
//!
//! All scheduler timestamps are expressed in core clock cycles. A timestamp that
//! has not been determined yet (an entry that is not ready, not issued, not done)
//! holds [`Cycle::INFINITE`], which compares greater than every real cycle. This
//! lets the scheduler fold events with plain `min`/`max` without `Option` juggling.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// A point in simulated time, or a duration, measured in core cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycle(pub u64);

impl Cycle {
    /// Time zero.
    pub const ZERO: Self = Self(0);

    /// Sentinel for "not yet known"; later than any reachable cycle.
    pub const INFINITE: Self = Self(u64::MAX);

    /// Returns true if this timestamp has not been set.
    #[inline]
    pub const fn is_infinite(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the raw cycle count.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `self - earlier`, or zero if `earlier` is later.
    #[inline]
    pub const fn saturating_since(self, earlier: Self) -> Self {
        Self(self.0.saturating_sub(earlier.0))
    }
}

impl Add<u64> for Cycle {
    type Output = Self;

    /// Saturating: adding to `INFINITE` stays `INFINITE`.
    #[inline]
    fn add(self, rhs: u64) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Add for Cycle {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cycle {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl AddAssign<u64> for Cycle {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl Sub for Cycle {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
