//! Trace replay over one or more cores.
//!
//! Each core owns a [`RobEngine`] and replays its own micro-op stream on its
//! own thread. The engines share one [`SharedLightCaches`] domain, so a line
//! brought in by one core is a sibling hit for the others and a store
//! invalidates the other copies. Cores are not clock-synchronized with each
//! other; cross-core cache effects depend on how the threads interleave.

use std::thread;

use tracing::{debug, info};

use crate::common::{RunError, SchedulerError};
use crate::config::Config;
use crate::core::memory::{MemoryAccess, SharedLightCaches};
use crate::core::uop::DynamicMicroOp;
use crate::core::{RobEngine, SimulateOutcome};
use crate::stats::RobStats;

/// How a trace is cut into `simulate` calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Batch {
    /// One call per instruction, closed by its last micro-op.
    #[default]
    Instruction,
    /// Fixed-size groups of micro-ops.
    MicroOps(usize),
}

/// Result of replaying one core's trace.
#[derive(Clone, Debug)]
pub struct CoreRun {
    /// Core index.
    pub core: usize,
    /// Totals over every `simulate` and the final drain.
    pub outcome: SimulateOutcome,
    /// Engine metrics at the end of the run.
    pub stats: RobStats,
}

/// Feeds `uops` to `engine` in `batch`-sized calls, then drains it.
///
/// # Errors
///
/// Propagates the first [`SchedulerError`] reported by the engine.
pub fn replay(
    engine: &mut RobEngine,
    uops: Vec<DynamicMicroOp>,
    batch: Batch,
) -> Result<SimulateOutcome, SchedulerError> {
    let mut outcome = SimulateOutcome::default();
    let mut pending = Vec::new();

    for uop in uops {
        let closes = match batch {
            Batch::Instruction => uop.is_last(),
            Batch::MicroOps(n) => pending.len() + 1 >= n.max(1),
        };
        pending.push(uop);
        if closes {
            let step = engine.simulate(pending.drain(..))?;
            outcome.instructions += step.instructions;
            outcome.latency += step.latency;
        }
    }
    if !pending.is_empty() {
        let step = engine.simulate(pending)?;
        outcome.instructions += step.instructions;
        outcome.latency += step.latency;
    }

    let tail = engine.drain()?;
    outcome.instructions += tail.instructions;
    outcome.latency += tail.latency;
    Ok(outcome)
}

/// Replays one trace per core, in parallel, over shared light caches.
///
/// # Errors
///
/// Returns [`RunError::Config`] if `config` is invalid and [`RunError::Core`]
/// for the lowest-numbered core whose engine failed.
pub fn run_cores(
    config: &Config,
    traces: Vec<Vec<DynamicMicroOp>>,
    batch: Batch,
) -> Result<Vec<CoreRun>, RunError> {
    config.validate()?;
    let caches = SharedLightCaches::new(traces.len(), &config.memory);
    info!(cores = traces.len(), ?batch, "starting replay");

    let engines = (0..traces.len())
        .map(|core| {
            let port: Box<dyn MemoryAccess> = Box::new(caches.port(core));
            RobEngine::new(config, port)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let results: Vec<Result<CoreRun, RunError>> = thread::scope(|scope| {
        let handles: Vec<_> = engines
            .into_iter()
            .zip(traces)
            .enumerate()
            .map(|(core, (mut engine, uops))| {
                scope.spawn(move || {
                    let outcome = replay(&mut engine, uops, batch)
                        .map_err(|source| RunError::Core { core, source })?;
                    debug!(core, instructions = outcome.instructions, cycles = outcome.latency.get(), "core finished");
                    Ok(CoreRun {
                        core,
                        outcome,
                        stats: engine.stats().clone(),
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    results.into_iter().collect()
}
