//! Structural issue-port contention.
//!
//! When enabled, the scheduler no longer caps issue at the dispatch width;
//! instead every ready micro-op must win a port of its class for the current
//! cycle. The model is consulted, never owned by the scheduling policy:
//! 1. **`init_cycle`:** Called once at the start of each issue pass.
//! 2. **`try_issue`:** Admits or denies one micro-op and claims its port.
//! 3. **`do_issue`:** Notifies that the admitted micro-op actually issued.
//! 4. **`no_more`:** Tells the scan it can stop early.

use crate::common::Cycle;
use crate::config::ContentionConfig;
use crate::core::uop::{DynamicMicroOp, PortClass};

/// Issue-port admission collaborator.
pub trait IssueContention: Send {
    /// Resets per-cycle port usage.
    fn init_cycle(&mut self, now: Cycle);

    /// Claims a port for `uop` if one is free this cycle.
    fn try_issue(&mut self, uop: &DynamicMicroOp) -> bool;

    /// Records that `uop` issued.
    fn do_issue(&mut self, uop: &DynamicMicroOp);

    /// True when no further micro-op can issue this cycle.
    fn no_more(&self) -> bool;
}

const CLASSES: usize = 5;

const fn class_index(port: PortClass) -> usize {
    match port {
        PortClass::Alu => 0,
        PortClass::Fp => 1,
        PortClass::Load => 2,
        PortClass::Store => 3,
        PortClass::Branch => 4,
    }
}

/// Per-class port capacities, reset every cycle.
#[derive(Clone, Debug)]
pub struct PortContention {
    capacity: [usize; CLASSES],
    used: [usize; CLASSES],
    cycle: Cycle,
    issued: u64,
}

impl PortContention {
    /// Builds the model from configured port counts.
    pub const fn new(config: &ContentionConfig) -> Self {
        Self {
            capacity: [
                config.alu_ports,
                config.fp_ports,
                config.load_ports,
                config.store_ports,
                config.branch_ports,
            ],
            used: [0; CLASSES],
            cycle: Cycle::ZERO,
            issued: 0,
        }
    }

    /// Micro-ops issued through this model since construction.
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    /// Cycle of the last `init_cycle` call.
    pub const fn cycle(&self) -> Cycle {
        self.cycle
    }
}

impl IssueContention for PortContention {
    fn init_cycle(&mut self, now: Cycle) {
        self.cycle = now;
        self.used = [0; CLASSES];
    }

    fn try_issue(&mut self, uop: &DynamicMicroOp) -> bool {
        let class = class_index(uop.port());
        if self.used[class] < self.capacity[class] {
            self.used[class] += 1;
            true
        } else {
            false
        }
    }

    fn do_issue(&mut self, _uop: &DynamicMicroOp) {
        self.issued += 1;
    }

    fn no_more(&self) -> bool {
        self.used.iter().zip(&self.capacity).all(|(u, c)| u >= c)
    }
}
