//! # Dependency Tests
//!
//! Wiring of register producers at insertion and consumer wake-up at issue.

use pretty_assertions::assert_eq;

use crate::common::builder::{alu, store};
use crate::common::harness::TestContext;

#[test]
fn test_consumer_waits_for_producer_latency() {
    let mut ctx = TestContext::new();
    let records = ctx.run(vec![alu(1).writes(&[1]).build(), alu(1).reads(&[1]).build()]);

    let producer = records[0].times;
    let consumer = records[1].times;
    assert_eq!(producer.issued.get(), 1);
    assert_eq!(consumer.issued.get(), 2);
    assert_eq!(consumer.done.get(), 4);
    assert_eq!(consumer.commit.get(), 4);
}

#[test]
fn test_long_chain_serializes() {
    let mut ctx = TestContext::new();
    let uops = vec![
        alu(5).writes(&[1]).build(),
        alu(3).reads(&[1]).writes(&[2]).build(),
        alu(2).reads(&[2]).writes(&[3]).build(),
    ];
    let records = ctx.run(uops);

    assert_eq!(records[0].times.issued.get(), 1);
    assert_eq!(records[1].times.issued.get(), 6);
    assert_eq!(records[2].times.issued.get(), 9);
}

#[test]
fn test_independent_ops_issue_together() {
    let mut ctx = TestContext::new();
    let uops = vec![
        alu(10).writes(&[1]).build(),
        alu(1).reads(&[1]).build(),
        alu(1).writes(&[2]).build(),
    ];
    let records = ctx.run(uops);

    // The third op does not wait behind the stalled consumer.
    assert_eq!(records[2].times.issued.get(), 1);
    assert_eq!(records[1].times.issued.get(), 11);
}

#[test]
fn test_last_writer_is_the_producer() {
    let mut ctx = TestContext::new();
    let uops = vec![
        alu(20).writes(&[1]).build(),
        alu(1).writes(&[1]).build(),
        alu(1).reads(&[1]).build(),
    ];
    let records = ctx.run(uops);
    assert_eq!(records[2].times.issued.get(), 2);
}

#[test]
fn test_intra_instruction_dependencies() {
    let mut ctx = TestContext::new();
    let uops = vec![
        alu(4).part(true, false).build(),
        alu(1).part(false, true).intra(1).build(),
    ];
    let records = ctx.run(uops);
    assert_eq!(records[1].times.issued.get(), 5);
}

#[test]
fn test_committed_producer_is_ignored() {
    let mut ctx = TestContext::new();
    let _ = ctx.run(vec![alu(30).writes(&[1]).build()]);
    let start = ctx.engine.now().get();

    let records = ctx.run(vec![alu(1).reads(&[1]).build()]);
    let consumer = records[1].times;
    assert_eq!(consumer.dispatched.get(), start);
    assert_eq!(consumer.issued.get(), start + 1);
    assert_eq!(ctx.engine.stats().producer_ins_distance[0], 2);
}

#[test]
fn test_issued_producer_bounds_ready_time_by_its_done_cycle() {
    let mut ctx = TestContext::new();
    // A slow head keeps the producer in the ROB after it has issued.
    let mut uops = vec![alu(50).build(), alu(3).writes(&[1]).build()];
    uops.extend((0..10).map(|_| alu(1).build()));
    let _ = ctx.engine.simulate(uops).unwrap();
    assert_eq!(ctx.engine.now().get(), 2);

    let _ = ctx.run(vec![alu(1).reads(&[1]).build()]);
    let producer = ctx.record(1).times;
    let consumer = ctx.record(12).times;
    assert_eq!(producer.done.get(), 5);
    assert_eq!(consumer.dispatched.get(), 3);
    assert_eq!(consumer.issued, producer.done);
}

#[test]
fn test_producer_distance_is_recorded() {
    let mut ctx = TestContext::new();
    let uops = vec![
        alu(5).writes(&[1]).build(),
        alu(1).build(),
        alu(1).build(),
        alu(1).reads(&[1]).build(),
    ];
    let _ = ctx.run(uops);
    let stats = ctx.engine.stats();
    assert_eq!(stats.producer_ins_distance[3], 1);
    assert_eq!(stats.producer_ins_distance[0], 3);
    assert_eq!(stats.total_consumers, 4);
    assert_eq!(stats.total_producer_ins_distance, 3);
}

#[test]
fn test_store_waits_for_its_address_register() {
    let mut ctx = TestContext::new();
    let uops = vec![alu(7).writes(&[4]).build(), store(0x80).addressed_by(&[4]).build()];
    let records = ctx.run(uops);

    let st = records[1].times;
    assert_eq!(st.issued.get(), 8);
    assert_eq!(st.done.get(), 9);
}

#[test]
fn test_dependants_overflow_inline_storage() {
    let mut ctx = TestContext::new();
    let mut uops = vec![alu(6).writes(&[1]).build()];
    uops.extend((0..20).map(|_| alu(1).reads(&[1]).build()));
    let records = ctx.run(uops);

    assert_eq!(records.len(), 21);
    assert!(records[1..].iter().all(|r| r.times.issued.get() >= 7));
}
