//! Architectural register identifiers.
//!
//! The timing core never reads register values; registers only name the edges
//! of the dependency graph. Identifiers are dense small integers assigned by
//! the decoder, so trackers can index flat tables with them.

use serde::{Deserialize, Serialize};

/// An architectural register as numbered by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegId(pub u16);

impl RegId {
    /// Returns the register number as a table index.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
