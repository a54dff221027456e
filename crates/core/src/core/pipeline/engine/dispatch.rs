//! Dispatch stage and CPI attribution.

use tracing::trace;

use super::RobEngine;
use crate::common::Cycle;
use crate::core::uop::HitWhere;
use crate::stats::CpiComponent;

impl RobEngine {
    /// Moves staged micro-ops into the window.
    ///
    /// Returns the earliest cycle dispatch could make progress again and the
    /// CPI component this pass is charged to.
    pub(super) fn do_dispatch(&mut self) -> (Cycle, CpiComponent) {
        let now = self.now;
        let mut next_event = Cycle::INFINITE;

        let frontend_stall = if self.frontend_stalled_until <= now {
            let mut stall = None;
            let mut dispatched = 0;

            while self.num_in_rob < self.config.window_size && dispatched < self.config.dispatch_width {
                let Some(entry) = self.rob.get_mut(self.num_in_rob) else {
                    break;
                };
                let uop = entry.uop();

                let icache_miss = uop.icache_hit_where() != HitWhere::L1I;
                if icache_miss && !self.in_icache_miss {
                    self.frontend_stalled_until = now + uop.icache_latency();
                    self.in_icache_miss = true;
                    stall = Some(CpiComponent::InstructionCache(uop.icache_hit_where()));
                    trace!(seq = entry.seq(), until = %self.frontend_stalled_until, "icache miss");
                    break;
                }

                if self.rs_entries_used == self.config.rs_entries {
                    stall = Some(CpiComponent::RsFull);
                    break;
                }

                // The fetch latency of this micro-op has been paid.
                if icache_miss {
                    self.in_icache_miss = false;
                }

                entry.dispatched = now;
                entry.ready = entry.ready.max(now + 1);
                next_event = next_event.min(entry.ready);
                let mispredicted = entry.uop().is_branch_mispredicted();
                self.num_in_rob += 1;
                self.rs_entries_used += 1;
                dispatched += 1;

                if mispredicted {
                    // Resumes when the branch resolves at issue.
                    self.frontend_stalled_until = Cycle::INFINITE;
                    stall = Some(CpiComponent::BranchPredictor);
                    break;
                }
            }

            self.current_frontend_stall = stall;
            stall
        } else {
            self.current_frontend_stall
        };

        let head = self.find_cpi_component();
        let window_full = self.num_in_rob == self.config.window_size;
        let component = match (frontend_stall, head) {
            (Some(_), Some(head)) => head,
            (Some(front), None) => front,
            (None, head) if window_full => head.unwrap_or(CpiComponent::Base),
            (None, _) => CpiComponent::Base,
        };

        let nothing_staged = self.num_in_rob == self.rob.len();
        if window_full || nothing_staged {
            (next_event, component)
        } else {
            (next_event.min(self.frontend_stalled_until), component)
        }
    }

    /// CPI component of the oldest micro-op still executing, if it explains a stall.
    fn find_cpi_component(&self) -> Option<CpiComponent> {
        let entry = self
            .rob
            .iter()
            .take(self.num_in_rob)
            .find(|entry| entry.done >= self.now)?;
        let template = entry.uop().uop();
        if template.is_serializing || template.is_mem_barrier {
            Some(CpiComponent::Serialization)
        } else if template.is_memory() {
            Some(CpiComponent::DataCache(entry.uop().dcache_hit_where()))
        } else {
            None
        }
    }
}
