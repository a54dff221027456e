//! Reorder-buffer scheduling engine.
//!
//! `RobEngine` reproduces the timing of an out-of-order core fed by a stream of
//! decoded micro-ops. It provides:
//! 1. **Insertion:** Numbers each micro-op, wires it to its in-flight producers
//!    and stages it behind the active window (`insert`).
//! 2. **Dispatch:** Moves staged micro-ops into the window under front-end,
//!    window and reservation-station limits (`dispatch`).
//! 3. **Issue:** Starts ready micro-ops subject to queue, port and memory-ordering
//!    rules, and wakes their consumers (`issue`).
//! 4. **Commit:** Retires finished micro-ops strictly in order (`commit`).
//! 5. **Skip-ahead:** Advances the clock straight to the next cycle at which
//!    anything can change (`clock`).
//!
//! The ROB is the arena: every cross-entry reference is a sequence number that
//! [`Rob::find`] resolves in constant time.

mod clock;
mod commit;
mod dispatch;
mod insert;
mod issue;

use std::fmt::{self, Write as _};

use tracing::debug;

use crate::common::{ConfigError, Cycle, SchedulerError};
use crate::config::{Config, RobConfig};
use crate::core::deps::{
    MemoryDependencies, MemoryDependencyTracker, RegisterDependencies, RegisterDependencyTracker,
};
use crate::core::memory::MemoryAccess;
use crate::core::pipeline::contention::{IssueContention, PortContention};
use crate::core::pipeline::queue::ContentionQueue;
use crate::core::pipeline::rob::Rob;
use crate::core::tracer::{InstructionTracer, NullTracer};
use crate::core::uop::DynamicMicroOp;
use crate::stats::{CpiComponent, RobStats};

/// Result of advancing the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulateOutcome {
    /// Instructions retired.
    pub instructions: u64,
    /// Simulated time elapsed.
    pub latency: Cycle,
}

impl SimulateOutcome {
    fn absorb(&mut self, instructions: u64, latency: Cycle) {
        self.instructions += instructions;
        self.latency += latency;
    }
}

/// Timing model of one out-of-order core.
pub struct RobEngine {
    config: RobConfig,
    rob: Rob,
    /// Entries at positions `< num_in_rob` are dispatched; the rest are staged.
    num_in_rob: usize,
    rs_entries_used: usize,

    now: Cycle,
    frontend_stalled_until: Cycle,
    in_icache_miss: bool,
    last_store_done: Cycle,
    last_commit: Cycle,
    last_accounted_memory_cycle: Cycle,
    current_frontend_stall: Option<CpiComponent>,

    next_sequence_number: u64,
    next_instruction_number: u64,

    load_queue: ContentionQueue,
    store_queue: ContentionQueue,

    memory: Box<dyn MemoryAccess>,
    register_deps: Box<dyn RegisterDependencies>,
    memory_deps: Box<dyn MemoryDependencies>,
    contention: Option<Box<dyn IssueContention>>,
    tracer: Box<dyn InstructionTracer>,

    x87_warned: bool,
    stats: RobStats,
}

impl RobEngine {
    /// Builds an engine around `memory` with the default dependency trackers,
    /// no tracer, and port contention if `config.rob.issue_contention` is set.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`Config::validate`].
    pub fn new(config: &Config, memory: Box<dyn MemoryAccess>) -> Result<Self, ConfigError> {
        config.validate()?;
        let rob_config = config.rob.clone();
        let contention: Option<Box<dyn IssueContention>> = if rob_config.issue_contention {
            Some(Box::new(PortContention::new(&config.contention)))
        } else {
            None
        };
        Ok(Self {
            rob: Rob::new(rob_config.ring_capacity()),
            num_in_rob: 0,
            rs_entries_used: 0,
            now: Cycle::ZERO,
            frontend_stalled_until: Cycle::ZERO,
            in_icache_miss: false,
            last_store_done: Cycle::ZERO,
            last_commit: Cycle::ZERO,
            last_accounted_memory_cycle: Cycle::ZERO,
            current_frontend_stall: None,
            next_sequence_number: 0,
            next_instruction_number: 0,
            load_queue: ContentionQueue::new(rob_config.outstanding_loads),
            store_queue: ContentionQueue::new(rob_config.outstanding_stores),
            memory,
            register_deps: Box::new(RegisterDependencyTracker::new()),
            memory_deps: Box::new(MemoryDependencyTracker::new()),
            contention,
            tracer: Box::new(NullTracer),
            x87_warned: false,
            stats: RobStats::new(rob_config.window_size, rob_config.mlp_histogram),
            config: rob_config,
        })
    }

    /// Replaces the retirement tracer.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Box<dyn InstructionTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Replaces the register dependency resolver.
    #[must_use]
    pub fn with_register_dependencies(mut self, deps: Box<dyn RegisterDependencies>) -> Self {
        self.register_deps = deps;
        self
    }

    /// Replaces the memory dependency resolver.
    #[must_use]
    pub fn with_memory_dependencies(mut self, deps: Box<dyn MemoryDependencies>) -> Self {
        self.memory_deps = deps;
        self
    }

    /// Models issue-port contention with `contention`, lifting the
    /// dispatch-width cap on issue.
    #[must_use]
    pub fn with_contention(mut self, contention: Box<dyn IssueContention>) -> Self {
        self.contention = Some(contention);
        self
    }

    /// Inserts `uops` and runs scheduling passes until the engine needs more
    /// input.
    ///
    /// Squashed micro-ops are dropped without occupying any resource. If the
    /// ring fills up during insertion, passes run until a slot frees.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulerError`] when a collaborator breaks its contract;
    /// engine state is then unspecified and the run must stop.
    pub fn simulate<I>(&mut self, uops: I) -> Result<SimulateOutcome, SchedulerError>
    where
        I: IntoIterator<Item = DynamicMicroOp>,
    {
        let mut outcome = SimulateOutcome::default();
        let mut inserted = 0usize;

        for uop in uops {
            if uop.is_squashed() {
                continue;
            }
            while self.rob.is_full() {
                let (instructions, latency) = self.execute(true)?;
                outcome.absorb(instructions, latency);
            }
            self.insert(uop)?;
            inserted += 1;
        }

        loop {
            let (instructions, latency) = self.execute(false)?;
            outcome.absorb(instructions, latency);
            if latency == Cycle::ZERO {
                break;
            }
        }

        debug!(
            inserted,
            retired = outcome.instructions,
            latency = outcome.latency.get(),
            now = self.now.get(),
            "simulate"
        );
        Ok(outcome)
    }

    /// Runs scheduling passes until every inserted micro-op has retired.
    ///
    /// # Errors
    ///
    /// See [`RobEngine::simulate`].
    pub fn drain(&mut self) -> Result<SimulateOutcome, SchedulerError> {
        let mut outcome = SimulateOutcome::default();
        while !self.rob.is_empty() {
            let (instructions, latency) = self.execute(true)?;
            outcome.absorb(instructions, latency);
        }
        debug!(
            retired = outcome.instructions,
            latency = outcome.latency.get(),
            "drain"
        );
        Ok(outcome)
    }

    /// Moves the engine clock to `time`, as decided by the enclosing clock model.
    pub const fn synchronize(&mut self, time: Cycle) {
        self.now = time;
    }

    /// Current engine time.
    pub const fn now(&self) -> Cycle {
        self.now
    }

    /// Collected metrics.
    pub const fn stats(&self) -> &RobStats {
        &self.stats
    }

    /// Scheduler configuration in use.
    pub const fn config(&self) -> &RobConfig {
        &self.config
    }

    /// Micro-ops in the ring, dispatched or staged.
    pub const fn len(&self) -> usize {
        self.rob.len()
    }

    /// True if nothing is in flight.
    pub const fn is_empty(&self) -> bool {
        self.rob.is_empty()
    }

    /// Micro-ops in the active window.
    pub const fn in_window(&self) -> usize {
        self.num_in_rob
    }

    /// Reservation-station entries in use.
    pub const fn rs_entries_used(&self) -> usize {
        self.rs_entries_used
    }

    /// Renders the ROB state, one line per entry.
    pub fn dump_rob(&self) -> String {
        let now = self.now;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "** ROB state @ {now}  size({}) total({})",
            self.num_in_rob,
            self.rob.len()
        );
        if self.frontend_stalled_until > now {
            let _ = write!(out, "   Front-end stalled");
            if !self.frontend_stalled_until.is_infinite() {
                let _ = write!(out, " until {}", self.frontend_stalled_until);
            }
            if self.in_icache_miss {
                let _ = write!(out, ", in I-cache miss");
            }
            out.push('\n');
        }
        let _ = writeln!(out, "   RS entries: {}", self.rs_entries_used);
        let _ = writeln!(
            out,
            "   Outstanding loads: {}  stores: {}",
            self.load_queue.occupied(now),
            self.store_queue.occupied(now)
        );
        for (pos, entry) in self.rob.iter().enumerate() {
            let state = if pos >= self.num_in_rob {
                "PREROB".to_owned()
            } else if entry.is_done_set() {
                format!("DONE@+{}", entry.done.saturating_since(now))
            } else if !entry.ready.is_infinite() {
                format!("READY@+{}", entry.ready.saturating_since(now))
            } else {
                let deps: Vec<String> = entry
                    .uop()
                    .dependencies()
                    .as_slice()
                    .iter()
                    .map(u64::to_string)
                    .collect();
                format!("DEPS {}", deps.join(" "))
            };
            let uop = entry.uop();
            let kind = if uop.uop().is_load() {
                "LOAD      ".to_owned()
            } else if uop.uop().is_store() {
                "STORE     ".to_owned()
            } else {
                format!("EXEC ({:>2}) ", uop.exec_latency())
            };
            let _ = write!(out, "   [{pos:>3}]  {state:<20}   {:>10}  {kind}", entry.seq());
            match (uop.uop().instruction_address, uop.address()) {
                (Some(eip), Some(access)) if uop.uop().is_memory() => {
                    let _ = write!(out, "{eip:x}  {{0x{:x}}}", access.address.val());
                }
                (Some(eip), _) => {
                    let _ = write!(out, "{eip:x}");
                }
                (None, _) => out.push_str("(dynamic)"),
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Debug for RobEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobEngine")
            .field("now", &self.now)
            .field("in_window", &self.num_in_rob)
            .field("total", &self.rob.len())
            .field("rs_entries_used", &self.rs_entries_used)
            .field("frontend_stalled_until", &self.frontend_stalled_until)
            .field("last_store_done", &self.last_store_done)
            .field("contention", &self.contention.is_some())
            .finish_non_exhaustive()
    }
}
