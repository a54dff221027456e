//! # Multi-Core Replay Tests

use pretty_assertions::assert_eq;

use robsim_core::common::{RunError, SchedulerError};
use robsim_core::config::Config;
use robsim_core::core::memory::{AccessKind, MemoryAccess, MemoryRequest, SharedLightCaches};
use robsim_core::core::uop::HitWhere;
use robsim_core::sim::{Batch, replay, run_cores};

use crate::common::builder::{alu, independent, load, store};
use crate::common::harness::TestContext;

fn memory_trace() -> Vec<robsim_core::core::uop::DynamicMicroOp> {
    (0..32)
        .map(|i| {
            if i % 2 == 0 {
                load(0x1000 + i * 64).build()
            } else {
                store(0x8000 + i * 64).build()
            }
        })
        .collect()
}

#[test]
fn test_each_core_retires_its_own_trace() {
    let runs = run_cores(
        &Config::default(),
        vec![memory_trace(), independent(10), memory_trace()],
        Batch::Instruction,
    )
    .unwrap();

    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].outcome.instructions, 32);
    assert_eq!(runs[1].outcome.instructions, 10);
    assert_eq!(runs[2].outcome.instructions, 32);
    assert_eq!(runs[0].stats.loads_count, 16);
    assert_eq!(runs[0].stats.stores_count, 16);
}

#[test]
fn test_every_batch_size_retires_in_program_order() {
    let trace = || {
        (0..40u16)
            .map(|i| alu(1 + u32::from(i % 3)).writes(&[i % 5]).reads(&[(i + 2) % 5]).build())
            .collect::<Vec<_>>()
    };

    for batch in [Batch::Instruction, Batch::MicroOps(3), Batch::MicroOps(1000)] {
        let mut ctx = TestContext::new();
        let outcome = replay(&mut ctx.engine, trace(), batch).unwrap();
        assert_eq!(outcome.instructions, 40);
        let seqs: Vec<u64> = ctx.tracer.records().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..40).collect::<Vec<_>>());
    }
}

#[test]
fn test_replay_drains_every_micro_op() {
    let mut ctx = TestContext::new();
    let outcome = replay(&mut ctx.engine, independent(23), Batch::MicroOps(5)).unwrap();
    assert_eq!(outcome.instructions, 23);
    assert!(ctx.engine.is_empty());
    assert_eq!(outcome.latency, ctx.engine.now());
}

#[test]
fn test_core_failure_names_the_core() {
    let mut bad = independent(40);
    bad.push(alu(1).intra(40).build());
    let err = run_cores(&Config::default(), vec![independent(4), bad], Batch::MicroOps(64)).unwrap_err();
    match err {
        RunError::Core { core, source } => {
            assert_eq!(core, 1);
            assert!(matches!(source, SchedulerError::TooManyDependencies { .. }));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_shared_caches_see_sibling_lines_and_invalidate_on_write() {
    let caches = SharedLightCaches::new(2, &Default::default());
    let mut core0 = caches.port(0);
    let mut core1 = caches.port(1);
    let request = |kind| MemoryRequest {
        kind,
        address: 0x4000,
        size: 8,
        eip: None,
        now: robsim_core::common::Cycle::ZERO,
    };

    assert_eq!(core0.access(&request(AccessKind::Read)).hit_where, HitWhere::Dram);
    assert_eq!(core0.access(&request(AccessKind::Read)).hit_where, HitWhere::L1Own);
    assert_eq!(core1.access(&request(AccessKind::Read)).hit_where, HitWhere::Sibling);
    assert_eq!(core1.access(&request(AccessKind::Write)).hit_where, HitWhere::L1Own);
    // core1's write removed core0's copy.
    assert_eq!(core0.access(&request(AccessKind::Read)).hit_where, HitWhere::Sibling);
}
