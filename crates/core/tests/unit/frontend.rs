//! # Front-End Tests
//!
//! Instruction-cache stalls, branch misprediction recovery, reservation
//! station pressure and window backpressure.

use pretty_assertions::assert_eq;

use robsim_core::core::uop::HitWhere;
use robsim_core::stats::CpiComponent;

use crate::common::builder::{alu, branch, independent};
use crate::common::harness::{TestContext, config_with};

#[test]
fn test_icache_miss_delays_dispatch() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![alu(1).icache_miss(HitWhere::L2Own, 20).build(), alu(1).build()]);

    assert_eq!(records[0].times.dispatched.get(), 20);
    assert_eq!(records[1].times.dispatched.get(), 20);
    let cpi = &ctx.engine.stats().cpi;
    assert_eq!(cpi.get(CpiComponent::InstructionCache(HitWhere::L2Own)), 20);
}

#[test]
fn test_consecutive_icache_misses_each_stall() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![
        alu(1).icache_miss(HitWhere::L2Own, 10).build(),
        alu(1).icache_miss(HitWhere::Dram, 30).build(),
    ]);

    assert_eq!(records[0].times.dispatched.get(), 10);
    assert_eq!(records[1].times.dispatched.get(), 40);
}

#[test]
fn test_mispredicted_branch_stalls_until_penalty_elapses() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![branch().mispredicted().build(), alu(1).build()]);

    let br = records[0].times;
    let next = records[1].times;
    assert_eq!(br.dispatched.get(), 0);
    assert_eq!(br.issued.get(), 1);
    // Refill starts two cycles early so the bubble matches the penalty.
    assert_eq!(next.dispatched, br.issued + (ctx.engine.config().misprediction_penalty - 2));
    assert!(ctx.engine.stats().cpi.branch_predictor > 0);
}

#[test]
fn test_correctly_predicted_branch_does_not_stall() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![branch().build(), alu(1).build()]);
    assert_eq!(records[1].times.dispatched.get(), 0);
    assert_eq!(ctx.engine.stats().cpi.branch_predictor, 0);
}

#[test]
fn test_mispredict_waits_for_branch_operands() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![
        alu(12).writes(&[3]).build(),
        branch().reads(&[3]).mispredicted().build(),
        alu(1).build(),
    ]);

    let br = records[1].times;
    assert_eq!(br.issued.get(), 13);
    assert_eq!(records[2].times.dispatched, br.issued + 6);
}

#[test]
fn test_full_reservation_stations_hold_dispatch() {
    let mut ctx = TestContext::with_config(config_with(|c| c.rob.rs_entries = 2));
    let records = ctx.run(independent(4));

    assert_eq!(records[0].times.dispatched.get(), 0);
    assert_eq!(records[1].times.dispatched.get(), 0);
    assert_eq!(records[2].times.dispatched.get(), 2);
    assert!(ctx.engine.stats().cpi.rs_full > 0);
}

#[test]
fn test_full_window_holds_dispatch_until_commit() {
    let mut ctx = TestContext::with_config(config_with(|c| {
        c.rob.window_size = 4;
        c.rob.staging_margin = 8;
    }));
    let records = ctx.run(independent(5));

    let first_commit = records[0].times.commit;
    assert_eq!(first_commit.get(), 3);
    assert!(records[4].times.dispatched > first_commit);
    assert_eq!(records[4].times.dispatched.get(), 4);
}

#[test]
fn test_ring_fills_and_drains_during_simulate() {
    let mut ctx = TestContext::with_config(config_with(|c| {
        c.rob.window_size = 4;
        c.rob.staging_margin = 8;
    }));
    let outcome = ctx.engine.simulate(independent(100)).unwrap();
    assert!(outcome.instructions > 0);
    assert!(ctx.engine.len() <= 12);

    let _ = ctx.engine.drain().unwrap();
    assert_eq!(ctx.tracer.records().len(), 100);
}

#[test]
fn test_dispatch_width_bounds_dispatch_per_cycle() {
    let mut ctx = TestContext::with_config(config_with(|c| c.rob.dispatch_width = 2));
    let records = ctx.run(independent(6));
    let dispatched: Vec<u64> = records.iter().map(|r| r.times.dispatched.get()).collect();
    assert_eq!(dispatched, vec![0, 0, 1, 1, 2, 2]);
}
