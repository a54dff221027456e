//! Memory hierarchy hit classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where in the memory hierarchy an access was satisfied.
///
/// Ordered from closest to farthest; `Unknown` means the access has not been
/// performed yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitWhere {
    /// Not yet accessed.
    #[default]
    Unknown,
    /// Level-1 instruction cache.
    L1I,
    /// Own level-1 data cache.
    L1Own,
    /// Own level-2 cache.
    L2Own,
    /// Own (or shared) last-level cache.
    L3Own,
    /// Another core's private cache.
    Sibling,
    /// Main memory.
    Dram,
}

impl HitWhere {
    /// Number of variants; sizes per-level statistics arrays.
    pub const COUNT: usize = 7;

    /// Every variant, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Unknown,
        Self::L1I,
        Self::L1Own,
        Self::L2Own,
        Self::L3Own,
        Self::Sibling,
        Self::Dram,
    ];

    /// Index into per-level arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name used in statistics output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::L1I => "l1i",
            Self::L1Own => "l1d",
            Self::L2Own => "l2",
            Self::L3Own => "l3",
            Self::Sibling => "sibling",
            Self::Dram => "dram",
        }
    }

    /// True for levels whose latency the core cannot hide behind the window.
    pub const fn is_long_latency(self) -> bool {
        matches!(self, Self::L3Own | Self::Sibling | Self::Dram)
    }
}

impl fmt::Display for HitWhere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
