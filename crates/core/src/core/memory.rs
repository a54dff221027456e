//! Memory access collaborator.
//!
//! Loads and stores consult a [`MemoryAccess`] implementation exactly once, at
//! issue, to learn their latency and where they hit. The scheduler treats the
//! call as blocking and side-effect free from its own point of view.
//!
//! Provided models:
//! 1. **[`FixedLatencyMemory`]:** Every access costs the same.
//! 2. **[`LightCache`]:** A direct-mapped cache in front of a flat memory latency.
//! 3. **[`SharedLightCaches`]:** One light cache per core behind a mutex, with
//!    sibling hits and write invalidation across cores.

use std::sync::{Arc, Mutex, PoisonError};

use crate::common::Cycle;
use crate::config::MemoryModelConfig;
use crate::core::uop::HitWhere;

/// Direction of an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Load.
    Read,
    /// Store.
    Write,
}

/// One data access issued by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryRequest {
    /// Direction.
    pub kind: AccessKind,
    /// Effective address.
    pub address: u64,
    /// Size in bytes.
    pub size: u32,
    /// Address of the issuing instruction, when known.
    pub eip: Option<u64>,
    /// Issue cycle.
    pub now: Cycle,
}

/// Outcome of an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryResult {
    /// Access latency in cycles.
    pub latency: u64,
    /// Level that satisfied the access.
    pub hit_where: HitWhere,
}

/// Data memory hierarchy as seen by one core.
pub trait MemoryAccess: Send {
    /// Performs one access.
    fn access(&mut self, request: &MemoryRequest) -> MemoryResult;
}

/// Constant-latency memory.
#[derive(Clone, Copy, Debug)]
pub struct FixedLatencyMemory {
    latency: u64,
    hit_where: HitWhere,
}

impl FixedLatencyMemory {
    /// Every access takes `latency` cycles and hits at `hit_where`.
    pub const fn new(latency: u64, hit_where: HitWhere) -> Self {
        Self { latency, hit_where }
    }
}

impl MemoryAccess for FixedLatencyMemory {
    fn access(&mut self, _request: &MemoryRequest) -> MemoryResult {
        MemoryResult {
            latency: self.latency,
            hit_where: self.hit_where,
        }
    }
}

const LINE_SHIFT: u32 = 6;
const LINES: usize = 4096;

/// Tag array of a direct-mapped cache.
#[derive(Clone, Debug)]
struct TagArray {
    tags: Vec<Option<u64>>,
}

impl TagArray {
    fn new() -> Self {
        Self {
            tags: vec![None; LINES],
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn slot(line: u64) -> usize {
        (line % LINES as u64) as usize
    }

    fn contains(&self, line: u64) -> bool {
        self.tags[Self::slot(line)] == Some(line)
    }

    fn fill(&mut self, line: u64) {
        self.tags[Self::slot(line)] = Some(line);
    }

    fn invalidate(&mut self, line: u64) {
        let slot = Self::slot(line);
        if self.tags[slot] == Some(line) {
            self.tags[slot] = None;
        }
    }
}

/// Direct-mapped 4096 x 64 B cache with a flat miss latency.
#[derive(Clone, Debug)]
pub struct LightCache {
    tags: TagArray,
    hit_latency: u64,
    miss_latency: u64,
}

impl LightCache {
    /// Builds an empty cache.
    pub fn new(config: &MemoryModelConfig) -> Self {
        Self {
            tags: TagArray::new(),
            hit_latency: config.hit_latency,
            miss_latency: config.miss_latency,
        }
    }
}

impl MemoryAccess for LightCache {
    fn access(&mut self, request: &MemoryRequest) -> MemoryResult {
        let line = request.address >> LINE_SHIFT;
        if self.tags.contains(line) {
            MemoryResult {
                latency: self.hit_latency,
                hit_where: HitWhere::L1Own,
            }
        } else {
            self.tags.fill(line);
            MemoryResult {
                latency: self.miss_latency,
                hit_where: HitWhere::Dram,
            }
        }
    }
}

#[derive(Debug)]
struct SharedState {
    caches: Vec<TagArray>,
}

/// Per-core light caches sharing one coherence domain.
#[derive(Clone, Debug)]
pub struct SharedLightCaches {
    state: Arc<Mutex<SharedState>>,
    hit_latency: u64,
    miss_latency: u64,
}

impl SharedLightCaches {
    /// Creates caches for `cores` cores.
    pub fn new(cores: usize, config: &MemoryModelConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState {
                caches: (0..cores).map(|_| TagArray::new()).collect(),
            })),
            hit_latency: config.hit_latency,
            miss_latency: config.miss_latency,
        }
    }

    /// Handle used by the engine of core `core`.
    pub fn port(&self, core: usize) -> CorePort {
        CorePort {
            core,
            shared: self.clone(),
        }
    }
}

/// One core's view of [`SharedLightCaches`].
#[derive(Clone, Debug)]
pub struct CorePort {
    core: usize,
    shared: SharedLightCaches,
}

impl MemoryAccess for CorePort {
    fn access(&mut self, request: &MemoryRequest) -> MemoryResult {
        let line = request.address >> LINE_SHIFT;
        let hit = self.shared.hit_latency;
        let miss = self.shared.miss_latency;
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let own_hit = state.caches.get(self.core).is_some_and(|c| c.contains(line));
        let sibling_hit = state
            .caches
            .iter()
            .enumerate()
            .any(|(i, c)| i != self.core && c.contains(line));

        if request.kind == AccessKind::Write {
            for (i, cache) in state.caches.iter_mut().enumerate() {
                if i != self.core {
                    cache.invalidate(line);
                }
            }
        }
        if let Some(own) = state.caches.get_mut(self.core) {
            own.fill(line);
        }

        if own_hit {
            MemoryResult {
                latency: hit,
                hit_where: HitWhere::L1Own,
            }
        } else if sibling_hit {
            MemoryResult {
                latency: hit + (miss - hit.min(miss)) / 2,
                hit_where: HitWhere::Sibling,
            }
        } else {
            MemoryResult {
                latency: miss,
                hit_where: HitWhere::Dram,
            }
        }
    }
}
