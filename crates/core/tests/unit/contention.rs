//! # Issue Contention Tests
//!
//! Port-class capacities and the issue-width cap that applies without them.

use pretty_assertions::assert_eq;

use robsim_core::config::ContentionConfig;
use robsim_core::core::memory::FixedLatencyMemory;
use robsim_core::core::pipeline::contention::PortContention;
use robsim_core::core::uop::{HitWhere, PortClass};
use robsim_core::RobEngine;

use crate::common::builder::{alu, independent, load};
use crate::common::harness::{TestContext, config_with};

fn issue_cycles(ctx: &TestContext) -> Vec<u64> {
    ctx.tracer.records().iter().map(|r| r.times.issued.get()).collect()
}

#[test]
fn test_issue_width_caps_issue_without_contention() {
    let mut ctx = TestContext::with_config(config_with(|c| c.rob.dispatch_width = 4));
    let _ = ctx.run(independent(8));
    assert_eq!(issue_cycles(&ctx), vec![1, 1, 1, 1, 2, 2, 2, 2]);
}

#[test]
fn test_alu_ports_limit_issue() {
    let mut ctx = TestContext::with_config(config_with(|c| {
        c.rob.issue_contention = true;
        c.contention.alu_ports = 3;
    }));
    let _ = ctx.run(independent(6));
    assert_eq!(issue_cycles(&ctx), vec![1, 1, 1, 2, 2, 2]);
}

#[test]
fn test_port_classes_are_independent() {
    let mut ctx = TestContext::with_config(config_with(|c| {
        c.rob.issue_contention = true;
        c.contention.alu_ports = 1;
        c.contention.load_ports = 1;
    }));
    let _ = ctx.run(vec![alu(1).build(), load(0x10).build(), alu(1).build(), load(0x20).build()]);
    assert_eq!(issue_cycles(&ctx), vec![1, 1, 2, 2]);
}

#[test]
fn test_explicit_port_binding() {
    let mut ctx = TestContext::with_config(config_with(|c| {
        c.rob.issue_contention = true;
        c.contention.alu_ports = 4;
        c.contention.fp_ports = 1;
    }));
    let _ = ctx.run(vec![
        alu(1).port(PortClass::Fp).build(),
        alu(1).port(PortClass::Fp).build(),
        alu(1).build(),
    ]);
    assert_eq!(issue_cycles(&ctx), vec![1, 2, 1]);
}

#[test]
fn test_contention_model_can_be_injected() {
    let config = config_with(|c| c.rob.dispatch_width = 4);
    let ports = ContentionConfig {
        alu_ports: 2,
        ..ContentionConfig::default()
    };
    let tracer = robsim_core::core::tracer::RecordingTracer::new();
    let mut engine = RobEngine::new(&config, Box::new(FixedLatencyMemory::new(4, HitWhere::L1Own)))
        .unwrap()
        .with_contention(Box::new(PortContention::new(&ports)))
        .with_tracer(Box::new(tracer.clone()));

    let _ = engine.simulate(independent(4)).unwrap();
    let _ = engine.drain().unwrap();
    let issued: Vec<u64> = tracer.records().iter().map(|r| r.times.issued.get()).collect();
    assert_eq!(issued, vec![1, 1, 2, 2]);
}
