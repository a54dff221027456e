//! # Commit Tests
//!
//! Retirement order, commit width and instruction boundaries.

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::{alu, independent};
use crate::common::harness::{TestContext, config_with};

#[test]
fn test_single_alu_lifecycle() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![alu(1).build()]);

    assert_eq!(records.len(), 1);
    let times = records[0].times;
    assert_eq!(times.dispatched.get(), 0);
    assert_eq!(times.issued.get(), 1);
    assert_eq!(times.done.get(), 3);
    assert_eq!(times.commit.get(), 3);
    assert_eq!(ctx.engine.now().get(), 4);
    assert!(ctx.engine.is_empty());
}

#[test]
fn test_retirement_is_in_program_order() {
    let mut ctx = TestContext::new();
    // A slow head must hold back everything behind it.
    let mut uops = vec![alu(20).build()];
    uops.extend(independent(6));
    let records = ctx.run(uops);

    let seqs: Vec<u64> = records.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, (0..7).collect::<Vec<_>>());
    let head_commit = records[0].times.commit;
    for r in &records[1..] {
        assert!(r.times.done < head_commit);
        assert!(r.times.commit >= head_commit);
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn test_commit_width_bounds_retirement_per_cycle(#[case] width: usize) {
    let mut ctx = TestContext::with_config(config_with(|c| c.rob.commit_width = width));
    let records = ctx.run(independent(16));

    assert_eq!(records.len(), 16);
    let mut per_cycle = std::collections::BTreeMap::new();
    for r in &records {
        *per_cycle.entry(r.times.commit.get()).or_insert(0usize) += 1;
    }
    assert!(per_cycle.values().all(|&n| n <= width));
    assert!(per_cycle.values().any(|&n| n == width));
}

#[test]
fn test_instructions_count_last_micro_ops() {
    let mut ctx = TestContext::new();
    let uops = vec![
        alu(1).part(true, false).build(),
        alu(1).part(false, false).build(),
        alu(1).part(false, true).build(),
        alu(1).build(),
    ];
    let outcome = ctx.try_run(uops).unwrap();
    assert_eq!(outcome.instructions, 2);

    let records = ctx.tracer.records();
    let numbers: Vec<u64> = records.iter().map(|r| r.instruction_number).collect();
    assert_eq!(numbers, vec![0, 0, 0, 1]);
    assert_eq!(records.iter().filter(|r| r.is_last).count(), 2);
    assert_eq!(ctx.engine.stats().instructions_committed, 2);
}

#[test]
fn test_squashed_micro_ops_never_enter_the_rob() {
    let mut ctx = TestContext::new();
    let uops = vec![alu(1).build(), alu(5).squashed().build(), alu(1).build()];
    let records = ctx.run(uops);

    let seqs: Vec<u64> = records.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![0, 1]);
    assert_eq!(ctx.engine.stats().uops_total, 2);
    assert_eq!(ctx.engine.rs_entries_used(), 0);
}

#[test]
fn test_simulate_asks_for_more_input_before_staging_two_groups() {
    let mut ctx = TestContext::new();
    // Fewer than two dispatch groups staged: nothing happens yet.
    let outcome = ctx.engine.simulate(independent(3)).unwrap();
    assert_eq!(outcome.latency.get(), 0);
    assert_eq!(ctx.engine.len(), 3);
    assert_eq!(ctx.engine.in_window(), 0);

    let drained = ctx.engine.drain().unwrap();
    assert_eq!(drained.instructions, 3);
    assert!(ctx.engine.is_empty());
}

#[test]
fn test_simulate_runs_once_enough_is_staged() {
    let mut ctx = TestContext::new();
    let outcome = ctx.engine.simulate(independent(40)).unwrap();
    assert!(outcome.latency.get() > 0);
    assert!(outcome.instructions > 0);
    // Returns as soon as fewer than two groups remain staged.
    assert!(ctx.engine.len() - ctx.engine.in_window() < 8);
}

#[test]
fn test_batches_accumulate_into_the_same_timeline() {
    let mut ctx = TestContext::new();
    let mut total = 0;
    for _ in 0..10 {
        total += ctx.engine.simulate(independent(5)).unwrap().instructions;
    }
    total += ctx.engine.drain().unwrap().instructions;
    assert_eq!(total, 50);

    let records = ctx.tracer.records();
    assert_eq!(records.len(), 50);
    assert!(records.windows(2).all(|w| w[0].seq + 1 == w[1].seq));
    assert!(records.windows(2).all(|w| w[0].times.commit <= w[1].times.commit));
}

#[test]
fn test_synchronize_moves_the_clock() {
    let mut ctx = TestContext::new();
    ctx.engine.synchronize(robsim_core::common::Cycle(100));
    let records = ctx.run(vec![alu(1).build()]);
    assert_eq!(records[0].times.dispatched.get(), 100);
    assert_eq!(records[0].times.commit.get(), 103);
}
