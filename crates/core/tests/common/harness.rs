use robsim_core::common::SchedulerError;
use robsim_core::config::Config;
use robsim_core::core::memory::{FixedLatencyMemory, MemoryAccess};
use robsim_core::core::tracer::{CommitRecord, RecordingTracer};
use robsim_core::core::uop::{DynamicMicroOp, HitWhere};
use robsim_core::{RobEngine, SimulateOutcome};
use tracing_subscriber::EnvFilter;

/// Latency of the default test memory.
pub const MEMORY_LATENCY: u64 = 4;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestContext {
    pub engine: RobEngine,
    pub tracer: RecordingTracer,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_memory(config, Box::new(FixedLatencyMemory::new(MEMORY_LATENCY, HitWhere::L1Own)))
    }

    pub fn with_memory(config: Config, memory: Box<dyn MemoryAccess>) -> Self {
        init_tracing();
        let tracer = RecordingTracer::new();
        let engine = RobEngine::new(&config, memory)
            .unwrap()
            .with_tracer(Box::new(tracer.clone()));
        Self { engine, tracer }
    }

    /// Rebuilds the engine through one of its `with_*` builders.
    pub fn customize(mut self, f: impl FnOnce(RobEngine) -> RobEngine) -> Self {
        self.engine = f(self.engine);
        self
    }

    /// Inserts `uops` in one call, then drains the engine.
    pub fn try_run(&mut self, uops: Vec<DynamicMicroOp>) -> Result<SimulateOutcome, SchedulerError> {
        let mut outcome = self.engine.simulate(uops)?;
        let tail = self.engine.drain()?;
        outcome.instructions += tail.instructions;
        outcome.latency += tail.latency;
        Ok(outcome)
    }

    /// Runs `uops` to completion and returns every retirement so far.
    pub fn run(&mut self, uops: Vec<DynamicMicroOp>) -> Vec<CommitRecord> {
        let _ = self.try_run(uops).unwrap();
        self.tracer.records()
    }

    pub fn record(&self, seq: u64) -> CommitRecord {
        self.tracer
            .records()
            .into_iter()
            .find(|r| r.seq == seq)
            .unwrap_or_else(|| panic!("micro-op {seq} never retired"))
    }
}

/// Default configuration with a few fields overridden.
pub fn config_with(f: impl FnOnce(&mut Config)) -> Config {
    let mut config = Config::default();
    f(&mut config);
    config
}
