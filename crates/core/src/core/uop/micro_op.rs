//! Static micro-operation templates.
//!
//! A `MicroOp` describes one primitive operation as produced by the decoder:
//! its class, latency, register operands and ordering properties. Templates are
//! immutable and shared (behind an `Arc`) by every dynamic instance decoded from
//! the same static instruction.

use serde::{Deserialize, Serialize};

use crate::common::RegId;

/// Execution class of a micro-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UopKind {
    /// Computation (including branches and fences).
    #[default]
    Execute,
    /// Memory read.
    Load,
    /// Memory write.
    Store,
}

/// Fine-grained class used for statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UopSubtype {
    /// Integer or other generic operation.
    #[default]
    Generic,
    /// Floating-point add/subtract.
    FpAddSub,
    /// Floating-point multiply/divide.
    FpMulDiv,
    /// Load.
    Load,
    /// Store.
    Store,
    /// Control transfer.
    Branch,
}

impl UopSubtype {
    /// Number of subtypes.
    pub const COUNT: usize = 6;

    /// Every subtype, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Generic,
        Self::FpAddSub,
        Self::FpMulDiv,
        Self::Load,
        Self::Store,
        Self::Branch,
    ];

    /// Index into per-subtype arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Statistics name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::FpAddSub => "fp_addsub",
            Self::FpMulDiv => "fp_muldiv",
            Self::Load => "load",
            Self::Store => "store",
            Self::Branch => "branch",
        }
    }
}

/// Issue port class a micro-op competes for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortClass {
    /// Integer ALU.
    Alu,
    /// Floating-point unit.
    Fp,
    /// Load pipe.
    Load,
    /// Store pipe.
    Store,
    /// Branch unit.
    Branch,
}

/// Immutable micro-op template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MicroOp {
    /// Execution class.
    pub kind: UopKind,
    /// Statistics class.
    pub subtype: UopSubtype,
    /// Base execution latency in cycles (bypass included, memory excluded).
    pub exec_latency: u32,
    /// Registers read as data operands.
    pub source_registers: Vec<RegId>,
    /// Registers written.
    pub destination_registers: Vec<RegId>,
    /// Registers used to compute the memory address.
    pub address_registers: Vec<RegId>,
    /// Width of the memory access in bytes (loads/stores only).
    pub memory_access_size: u32,
    /// Preceding micro-ops of the same instruction this one waits for.
    pub intra_instruction_dependencies: u32,
    /// First micro-op of its instruction.
    pub is_first: bool,
    /// Last micro-op of its instruction.
    pub is_last: bool,
    /// Must execute alone at the head of the window.
    pub is_serializing: bool,
    /// Memory fence.
    pub is_mem_barrier: bool,
    /// Legacy x87 floating point.
    pub is_x87: bool,
    /// Spin-loop hint.
    pub is_pause: bool,
    /// Address of the static instruction, when known.
    pub instruction_address: Option<u64>,
}

impl MicroOp {
    /// A single-micro-op computation with the given latency.
    pub fn execute(exec_latency: u32) -> Self {
        Self {
            kind: UopKind::Execute,
            subtype: UopSubtype::Generic,
            exec_latency,
            is_first: true,
            is_last: true,
            ..Self::default()
        }
    }

    /// A single-micro-op load of `size` bytes.
    pub fn load(size: u32) -> Self {
        Self {
            kind: UopKind::Load,
            subtype: UopSubtype::Load,
            memory_access_size: size,
            ..Self::execute(0)
        }
    }

    /// A single-micro-op store of `size` bytes.
    pub fn store(size: u32) -> Self {
        Self {
            kind: UopKind::Store,
            subtype: UopSubtype::Store,
            memory_access_size: size,
            ..Self::execute(0)
        }
    }

    /// A single-cycle conditional branch.
    pub fn branch() -> Self {
        Self {
            subtype: UopSubtype::Branch,
            ..Self::execute(1)
        }
    }

    /// A full memory fence.
    pub fn fence() -> Self {
        Self {
            is_mem_barrier: true,
            ..Self::execute(1)
        }
    }

    /// A serializing instruction (e.g. a CPUID-like operation).
    pub fn serializing(exec_latency: u32) -> Self {
        Self {
            is_serializing: true,
            ..Self::execute(exec_latency)
        }
    }

    /// Replaces the data source registers.
    #[must_use]
    pub fn reads(mut self, regs: &[u16]) -> Self {
        self.source_registers = regs.iter().copied().map(RegId).collect();
        self
    }

    /// Replaces the destination registers.
    #[must_use]
    pub fn writes(mut self, regs: &[u16]) -> Self {
        self.destination_registers = regs.iter().copied().map(RegId).collect();
        self
    }

    /// Replaces the address registers.
    #[must_use]
    pub fn addressed_by(mut self, regs: &[u16]) -> Self {
        self.address_registers = regs.iter().copied().map(RegId).collect();
        self
    }

    /// Marks the position of this micro-op inside a multi-micro-op instruction.
    #[must_use]
    pub const fn part_of_instruction(mut self, first: bool, last: bool) -> Self {
        self.is_first = first;
        self.is_last = last;
        self
    }

    /// Sets the count of preceding same-instruction micro-ops this one consumes.
    #[must_use]
    pub const fn with_intra_dependencies(mut self, count: u32) -> Self {
        self.intra_instruction_dependencies = count;
        self
    }

    /// True for loads.
    #[inline]
    pub fn is_load(&self) -> bool {
        self.kind == UopKind::Load
    }

    /// True for stores.
    #[inline]
    pub fn is_store(&self) -> bool {
        self.kind == UopKind::Store
    }

    /// True for loads and stores.
    #[inline]
    pub fn is_memory(&self) -> bool {
        self.kind != UopKind::Execute
    }

    /// True for branches.
    #[inline]
    pub fn is_branch(&self) -> bool {
        self.subtype == UopSubtype::Branch
    }

    /// Port class derived from the operation class.
    pub fn default_port(&self) -> PortClass {
        match (self.kind, self.subtype) {
            (UopKind::Load, _) => PortClass::Load,
            (UopKind::Store, _) => PortClass::Store,
            (UopKind::Execute, UopSubtype::Branch) => PortClass::Branch,
            (UopKind::Execute, UopSubtype::FpAddSub | UopSubtype::FpMulDiv) => PortClass::Fp,
            (UopKind::Execute, _) => PortClass::Alu,
        }
    }
}
