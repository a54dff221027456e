//! # Scheduling Properties
//!
//! Randomized traces checked against the invariants every schedule must hold,
//! and against a cycle-by-cycle run of the same trace.

use proptest::prelude::*;

use robsim_core::config::Config;
use robsim_core::core::tracer::CommitRecord;
use robsim_core::core::uop::{DynamicMicroOp, HitWhere};

use crate::common::builder::{alu, branch, fence, load, serializing, store};
use crate::common::harness::TestContext;

#[derive(Clone, Debug)]
enum Op {
    Alu { latency: u32, src: u16, dst: u16 },
    Load { slot: u64, base: u16, dst: u16, miss: bool },
    Store { slot: u64, base: u16, data: u16 },
    Branch { src: u16, mispredicted: bool },
    Fence,
    Serializing,
    IcacheMiss { latency: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1u32..8, 0u16..8, 0u16..8).prop_map(|(latency, src, dst)| Op::Alu { latency, src, dst }),
        3 => (0u64..4, 0u16..8, 0u16..8, any::<bool>())
            .prop_map(|(slot, base, dst, miss)| Op::Load { slot, base, dst, miss }),
        2 => (0u64..4, 0u16..8, 0u16..8).prop_map(|(slot, base, data)| Op::Store { slot, base, data }),
        2 => (0u16..8, any::<bool>()).prop_map(|(src, mispredicted)| Op::Branch { src, mispredicted }),
        1 => Just(Op::Fence),
        1 => Just(Op::Serializing),
        1 => (1u64..20).prop_map(|latency| Op::IcacheMiss { latency }),
    ]
}

fn build(ops: &[Op]) -> Vec<DynamicMicroOp> {
    ops.iter()
        .map(|op| match *op {
            Op::Alu { latency, src, dst } => alu(latency).reads(&[src]).writes(&[dst]).build(),
            Op::Load { slot, base, dst, miss } => {
                let ld = load(0x1000 + slot * 8).addressed_by(&[base]).writes(&[dst]);
                if miss { ld.dcache(HitWhere::Dram, 40).build() } else { ld.build() }
            }
            Op::Store { slot, base, data } => store(0x1000 + slot * 8).addressed_by(&[base]).reads(&[data]).build(),
            Op::Branch { src, mispredicted } => {
                let br = branch().reads(&[src]);
                if mispredicted { br.mispredicted().build() } else { br.build() }
            }
            Op::Fence => fence().build(),
            Op::Serializing => serializing(2).build(),
            Op::IcacheMiss { latency } => alu(1).icache_miss(HitWhere::L2Own, latency).build(),
        })
        .collect()
}

#[derive(Clone, Debug)]
struct Shape {
    window_size: usize,
    dispatch_width: usize,
    commit_width: usize,
    rs_entries: usize,
    in_order: bool,
    forwarding: bool,
    disambiguation: bool,
    contention: bool,
}

fn shape() -> impl Strategy<Value = Shape> {
    (
        2usize..24,
        1usize..5,
        1usize..5,
        1usize..40,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(window_size, dispatch_width, commit_width, rs_entries, in_order, forwarding, disambiguation, contention)| {
                Shape {
                    window_size,
                    dispatch_width,
                    commit_width,
                    rs_entries,
                    in_order,
                    forwarding,
                    disambiguation,
                    contention,
                }
            },
        )
}

fn config(shape: &Shape, skip_ahead: bool) -> Config {
    let mut config = Config::default();
    config.rob.window_size = shape.window_size;
    config.rob.dispatch_width = shape.dispatch_width;
    config.rob.commit_width = shape.commit_width;
    config.rob.rs_entries = shape.rs_entries;
    config.rob.in_order = shape.in_order;
    config.rob.store_to_load_forwarding = shape.forwarding;
    config.rob.address_disambiguation = shape.disambiguation;
    config.rob.issue_contention = shape.contention;
    config.rob.outstanding_loads = 2;
    config.rob.outstanding_stores = 2;
    config.rob.skip_ahead = skip_ahead;
    config
}

fn run(ops: &[Op], shape: &Shape, skip_ahead: bool) -> (Vec<CommitRecord>, u64) {
    let mut ctx = TestContext::with_config(config(shape, skip_ahead));
    let records = ctx.run(build(ops));
    (records, ctx.engine.now().get())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn skip_ahead_matches_cycle_by_cycle(ops in prop::collection::vec(op(), 1..60), shape in shape()) {
        let (skipped, skipped_end) = run(&ops, &shape, true);
        let (stepped, stepped_end) = run(&ops, &shape, false);
        prop_assert_eq!(skipped, stepped);
        prop_assert_eq!(skipped_end, stepped_end);
    }

    #[test]
    fn schedules_respect_pipeline_invariants(ops in prop::collection::vec(op(), 1..80), shape in shape()) {
        let (records, _) = run(&ops, &shape, true);

        // Everything retires, in program order.
        prop_assert_eq!(records.len(), ops.len());
        for (i, r) in records.iter().enumerate() {
            prop_assert_eq!(r.seq, i as u64);
        }

        for r in &records {
            let t = r.times;
            prop_assert!(t.dispatched < t.issued);
            prop_assert!(t.issued < t.done);
            prop_assert!(t.done <= t.commit);
        }

        for pair in records.windows(2) {
            prop_assert!(pair[0].times.commit <= pair[1].times.commit);
        }

        // Commit width per cycle.
        let mut run_len = 0;
        for (i, r) in records.iter().enumerate() {
            run_len = if i > 0 && records[i - 1].times.commit == r.times.commit { run_len + 1 } else { 1 };
            prop_assert!(run_len <= shape.commit_width);
        }

        // A window slot freed by commit is reused no earlier than the next cycle.
        for (i, r) in records.iter().enumerate().skip(shape.window_size) {
            prop_assert!(r.times.dispatched > records[i - shape.window_size].times.commit);
        }

        // In-order issue.
        if shape.in_order {
            for pair in records.windows(2) {
                prop_assert!(pair[0].times.issued <= pair[1].times.issued);
            }
        }
    }

    #[test]
    fn memory_ops_never_pass_a_fence(ops in prop::collection::vec(op(), 1..60), shape in shape()) {
        let (records, _) = run(&ops, &shape, true);
        for (i, op) in ops.iter().enumerate() {
            if !matches!(op, Op::Fence) {
                continue;
            }
            let fence_issued = records[i].times.issued;
            for (later, younger) in ops.iter().enumerate().skip(i + 1) {
                if matches!(younger, Op::Load { .. } | Op::Store { .. }) {
                    prop_assert!(records[later].times.issued >= fence_issued);
                }
            }
            // Older stores have drained before the fence issues.
            for (earlier, older) in ops.iter().enumerate().take(i) {
                if matches!(older, Op::Store { .. }) {
                    prop_assert!(records[earlier].times.issued < fence_issued);
                }
            }
        }
    }

    #[test]
    fn consumers_wait_for_producers(ops in prop::collection::vec(op(), 1..60), shape in shape()) {
        let (records, _) = run(&ops, &shape, true);
        let mut last_alu_writer: [Option<(usize, u32)>; 8] = [None; 8];
        for (i, op) in ops.iter().enumerate() {
            if let Op::Alu { latency, src, dst } = *op {
                if let Some((producer, producer_latency)) = last_alu_writer[src as usize] {
                    let ready = records[producer].times.issued + u64::from(producer_latency);
                    prop_assert!(records[i].times.issued >= ready);
                }
                last_alu_writer[dst as usize] = Some((i, latency));
            } else if let Op::Load { dst, .. } = *op {
                last_alu_writer[dst as usize] = None;
            }
        }
    }
}
