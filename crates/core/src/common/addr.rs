//! Memory operand descriptors.
//!
//! Loads and stores carry the virtual address and size of their access. The
//! front end resolves both before a micro-op reaches the scheduler, so no
//! translation happens here.

use serde::{Deserialize, Serialize};

/// A virtual address as seen by the simulated program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtAddr(pub u64);

impl VirtAddr {
    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }
}

/// Address and width of one memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemAccess {
    /// Accessed virtual address.
    pub address: VirtAddr,
    /// Access size in bytes.
    pub size: u32,
}

impl MemAccess {
    /// Creates a new access descriptor.
    pub const fn new(address: u64, size: u32) -> Self {
        Self {
            address: VirtAddr(address),
            size,
        }
    }
}
