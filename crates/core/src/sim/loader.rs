//! Micro-op trace loader.
//!
//! Traces are JSON lines: one object per dynamic micro-op, in program order.
//! Blank lines and lines starting with `#` are ignored. Omitted fields take
//! the value of a single-micro-op, single-cycle ALU operation that hits in the
//! instruction cache.
//!
//! ```text
//! {"kind":"load","src":[],"dst":[3],"addr_regs":[1],"address":4096,"size":8}
//! {"latency":3,"src":[3],"dst":[4]}
//! {"subtype":"branch","latency":1,"src":[4],"branch":{"taken":true,"mispredicted":true,"target":64}}
//! ```
//!
//! Identical templates are interned so every instance of a static micro-op
//! shares one [`MicroOp`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::common::{MemAccess, RegId, TraceError};
use crate::core::uop::{ArchPayload, DynamicMicroOp, HitWhere, MicroOp, PortClass, UopKind, UopSubtype};

/// Branch outcome as recorded in a trace.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct BranchRecord {
    /// Taken.
    #[serde(default)]
    pub taken: bool,
    /// Mispredicted.
    #[serde(default)]
    pub mispredicted: bool,
    /// Target address.
    #[serde(default)]
    pub target: u64,
}

/// One line of a trace.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceRecord {
    /// Execution class.
    #[serde(default)]
    pub kind: UopKind,
    /// Statistics class; derived from `kind` when omitted.
    #[serde(default)]
    pub subtype: Option<UopSubtype>,
    /// Base execution latency.
    #[serde(default = "TraceRecord::default_latency")]
    pub latency: u32,
    /// Data source registers.
    #[serde(default)]
    pub src: Vec<u16>,
    /// Destination registers.
    #[serde(default)]
    pub dst: Vec<u16>,
    /// Address registers.
    #[serde(default)]
    pub addr_regs: Vec<u16>,
    /// Effective address of a load or store.
    #[serde(default)]
    pub address: Option<u64>,
    /// Access size in bytes.
    #[serde(default = "TraceRecord::default_size")]
    pub size: u32,
    /// Branch outcome.
    #[serde(default)]
    pub branch: Option<BranchRecord>,
    /// First micro-op of its instruction.
    #[serde(default = "TraceRecord::default_true")]
    pub first: bool,
    /// Last micro-op of its instruction.
    #[serde(default = "TraceRecord::default_true")]
    pub last: bool,
    /// Earlier micro-ops of the same instruction this one consumes.
    #[serde(default)]
    pub intra: u32,
    /// Wrong-path micro-op.
    #[serde(default)]
    pub squashed: bool,
    /// Serializing.
    #[serde(default)]
    pub serializing: bool,
    /// Memory fence.
    #[serde(default)]
    pub fence: bool,
    /// x87 floating point.
    #[serde(default)]
    pub x87: bool,
    /// Pause hint.
    #[serde(default)]
    pub pause: bool,
    /// Instruction address.
    #[serde(default)]
    pub eip: Option<u64>,
    /// Where the fetch hit.
    #[serde(default = "TraceRecord::default_icache")]
    pub icache: HitWhere,
    /// Fetch stall on a miss, in cycles.
    #[serde(default)]
    pub icache_latency: u64,
    /// Bind to a specific issue port class.
    #[serde(default)]
    pub port: Option<PortClass>,
}

impl TraceRecord {
    const fn default_latency() -> u32 {
        1
    }

    const fn default_size() -> u32 {
        8
    }

    const fn default_true() -> bool {
        true
    }

    const fn default_icache() -> HitWhere {
        HitWhere::L1I
    }

    fn template(&self) -> MicroOp {
        let subtype = self.subtype.unwrap_or(match self.kind {
            UopKind::Load => UopSubtype::Load,
            UopKind::Store => UopSubtype::Store,
            UopKind::Execute if self.branch.is_some() => UopSubtype::Branch,
            UopKind::Execute => UopSubtype::Generic,
        });
        let regs = |r: &[u16]| r.iter().copied().map(RegId).collect::<Vec<_>>();
        MicroOp {
            kind: self.kind,
            subtype,
            exec_latency: if self.kind == UopKind::Execute { self.latency } else { 0 },
            source_registers: regs(&self.src),
            destination_registers: regs(&self.dst),
            address_registers: regs(&self.addr_regs),
            memory_access_size: if self.kind == UopKind::Execute { 0 } else { self.size },
            intra_instruction_dependencies: self.intra,
            is_first: self.first,
            is_last: self.last,
            is_serializing: self.serializing,
            is_mem_barrier: self.fence,
            is_x87: self.x87,
            is_pause: self.pause,
            instruction_address: self.eip,
        }
    }
}

/// Parses traces, interning micro-op templates across calls.
#[derive(Debug, Default)]
pub struct TraceLoader {
    templates: HashMap<MicroOp, Arc<MicroOp>>,
}

impl TraceLoader {
    /// A loader with no interned templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct templates seen so far.
    pub fn distinct_templates(&self) -> usize {
        self.templates.len()
    }

    /// Turns one record into a dynamic micro-op.
    pub fn instantiate(&mut self, record: &TraceRecord) -> DynamicMicroOp {
        let template = record.template();
        let shared = Arc::clone(
            self.templates
                .entry(template)
                .or_insert_with_key(|t| Arc::new(t.clone())),
        );

        let mut uop = DynamicMicroOp::new(shared).with_icache(record.icache, record.icache_latency);
        if let Some(address) = record.address {
            uop = uop.with_address(MemAccess::new(address, record.size));
        }
        if let Some(b) = record.branch {
            uop = uop.with_branch(b.taken, b.mispredicted, b.target);
        }
        if let Some(port) = record.port {
            uop = uop.with_payload(ArchPayload::Ported { port });
        }
        if record.squashed {
            uop = uop.squash();
        }
        uop
    }

    /// Parses a whole trace held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Record`] for the first malformed line.
    pub fn load_str(&mut self, text: &str) -> Result<Vec<DynamicMicroOp>, TraceError> {
        let mut uops = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record: TraceRecord =
                serde_json::from_str(line).map_err(|source| TraceError::Record { line: idx + 1, source })?;
            uops.push(self.instantiate(&record));
        }
        debug!(uops = uops.len(), templates = self.templates.len(), "trace loaded");
        Ok(uops)
    }

    /// Reads and parses a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Io`] if the file cannot be read and
    /// [`TraceError::Record`] for the first malformed line.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<DynamicMicroOp>, TraceError> {
        let text = fs::read_to_string(path)?;
        self.load_str(&text)
    }
}
