//! Issue stage.
//!
//! The scan walks the window from the oldest entry. Entries that cannot issue
//! clear `head_of_queue` for everyone behind them; stores and fences may only
//! issue at the logical head.

use tracing::trace;

use super::RobEngine;
use crate::common::{Cycle, SchedulerError};
use crate::core::memory::{AccessKind, MemoryRequest};
use crate::core::uop::HitWhere;

impl RobEngine {
    /// Issues every micro-op allowed to start this cycle.
    ///
    /// Returns the earliest cycle at which an entry in the window becomes ready
    /// or done.
    pub(super) fn do_issue(&mut self) -> Result<Cycle, SchedulerError> {
        let now = self.now;
        let mut next_event = Cycle::INFINITE;
        let mut num_issued = 0;
        let mut head_of_queue = true;
        let mut no_more_load = false;
        let mut no_more_store = false;
        let mut have_unresolved_store = false;

        if let Some(contention) = self.contention.as_mut() {
            contention.init_cycle(now);
        }

        for pos in 0..self.num_in_rob {
            let Some(entry) = self.rob.get(pos) else {
                break;
            };

            if entry.is_done_set() {
                next_event = next_event.min(entry.done);
                continue;
            }
            next_event = next_event.min(entry.ready);

            let uop = entry.uop();
            let template = uop.uop();
            let is_load = template.is_load();
            let is_store = template.is_store();

            let mut can_issue = if entry.ready > now {
                false
            } else if (no_more_load && is_load) || (no_more_store && is_store) {
                false
            } else if template.is_serializing {
                if head_of_queue && self.last_store_done <= now {
                    true
                } else {
                    break;
                }
            } else if template.is_mem_barrier {
                head_of_queue && self.last_store_done <= now
            } else if self.contention.is_none() && num_issued == self.config.dispatch_width {
                false
            } else if is_load && !self.load_queue.has_free_slot(now) {
                false
            } else if is_load && !self.config.address_disambiguation && have_unresolved_store {
                false
            } else {
                !(is_store && (!head_of_queue || !self.store_queue.has_free_slot(now)))
            };

            // Claiming a port is the last check since it has side effects.
            if can_issue {
                if let Some(contention) = self.contention.as_mut() {
                    can_issue = contention.try_issue(uop);
                }
            }

            if can_issue {
                num_issued += 1;
                self.issue_instruction(pos, &mut next_event)?;
                if is_load {
                    self.account_long_latency_load(pos);
                }
            } else {
                head_of_queue = false;
                // Younger memory operations may not pass a fence that has not issued.
                if template.is_mem_barrier {
                    no_more_load = true;
                    no_more_store = true;
                }
                if is_store && entry.address_ready > now {
                    have_unresolved_store = true;
                }
                if self.config.in_order {
                    break;
                }
            }

            let stop = self.contention.as_ref().map_or(
                num_issued == self.config.dispatch_width,
                |contention| contention.no_more(),
            );
            if stop {
                break;
            }
        }

        Ok(next_event)
    }

    /// Starts the micro-op at window position `pos` and wakes its consumers.
    fn issue_instruction(&mut self, pos: usize, next_event: &mut Cycle) -> Result<(), SchedulerError> {
        let now = self.now;
        let front = self.rob.front_seq().unwrap_or(0);
        let Some(entry) = self.rob.get_mut(pos) else {
            return Err(SchedulerError::SequenceOutOfRange {
                seq: front + pos as u64,
                front,
                len: self.num_in_rob,
            });
        };

        let uop = entry.uop_mut();
        let template = uop.uop();
        let (is_load, is_store) = (template.is_load(), template.is_store());
        let (serializing, barrier) = (template.is_serializing, template.is_mem_barrier);

        if (is_load || is_store) && uop.dcache_hit_where() == HitWhere::Unknown {
            let request = MemoryRequest {
                kind: if is_load { AccessKind::Read } else { AccessKind::Write },
                address: uop.address().map_or(0, |a| a.address.val()),
                size: uop.address().map_or(template.memory_access_size, |a| a.size),
                eip: template.instruction_address,
                now,
            };
            let result = self.memory.access(&request);
            uop.add_exec_latency(result.latency);
            uop.set_dcache_hit_where(result.hit_where);
        }

        let latency = uop.exec_latency();
        if is_load {
            let _ = self.load_queue.get_completion_time(now, latency);
            self.stats.loads_count += 1;
            self.stats.loads_latency += latency;
        } else if is_store {
            let _ = self.store_queue.get_completion_time(now, latency);
            self.stats.stores_count += 1;
            self.stats.stores_latency += latency;
        }

        // When consumers may start, and when this entry may commit.
        let mut cycle_depend = now + latency;
        let mut cycle_done = cycle_depend + 1;

        if is_store {
            self.last_store_done = self.last_store_done.max(cycle_done);
            // Stores forward after one cycle and leave the window once handed
            // to the memory hierarchy; fences wait on `last_store_done`.
            cycle_depend = now + 1;
            cycle_done = now + 1;
            if entry.address_ready > entry.ready {
                return Err(SchedulerError::StoreAddressAfterReady {
                    seq: entry.seq(),
                    address_ready: entry.address_ready,
                    ready: entry.ready,
                });
            }
        }

        if serializing {
            self.stats.num_serialization_insns += 1;
            self.stats.total_serialization_latency += now.saturating_since(entry.dispatched).get();
        } else if barrier {
            self.stats.num_mfence_insns += 1;
            self.stats.total_mfence_latency += now.saturating_since(entry.dispatched).get();
        }

        if let Some(contention) = self.contention.as_mut() {
            contention.do_issue(entry.uop());
        }

        entry.issued = now;
        entry.done = cycle_done;
        *next_event = (*next_event).min(cycle_done);
        self.rs_entries_used = self.rs_entries_used.saturating_sub(1);

        let seq = entry.seq();
        let mispredicted = entry.uop().is_branch_mispredicted();
        let dependants = entry.dependants().len();
        trace!(seq, latency, done = %cycle_done, dependants, "issue");

        for idx in 0..dependants {
            let Some(dep_seq) = self.rob.get(pos).and_then(|e| e.dependants().get(idx)) else {
                break;
            };
            self.wake_dependant(seq, dep_seq, cycle_depend)?;
        }

        if mispredicted {
            // Refill starts two cycles early so the total bubble is the penalty.
            self.frontend_stalled_until = now + self.config.misprediction_penalty.saturating_sub(2);
            *next_event = (*next_event).min(self.frontend_stalled_until);
        }
        Ok(())
    }

    /// Tells `dep_seq` that producer `seq` delivers its result at `cycle_depend`.
    fn wake_dependant(&mut self, seq: u64, dep_seq: u64, cycle_depend: Cycle) -> Result<(), SchedulerError> {
        let front = self.rob.front_seq().unwrap_or(0);
        let dep = self.rob.find_mut(dep_seq)?;
        if dep.uop().dependencies().is_empty() {
            return Err(SchedulerError::DanglingDependant {
                producer: seq,
                dependant: dep_seq,
            });
        }

        dep.ready_max = dep.ready_max.max(cycle_depend);
        let _ = dep.uop_mut().remove_dependency(seq);
        if dep.uop().dependencies().is_empty() {
            // Zero-latency producers must not let a consumer issue in its dispatch cycle.
            dep.ready = if dep.dispatched.is_infinite() {
                dep.ready_max
            } else {
                dep.ready_max.max(dep.dispatched + 1)
            };
        }

        if !dep.uop().uop().is_store() || !dep.address_ready.is_infinite() {
            return Ok(());
        }

        let producers = dep.address_producers().to_vec();
        let mut address_ready_max = dep.address_ready_max;
        let mut resolved = true;
        for producer in producers {
            if producer < front {
                continue;
            }
            if producer == seq {
                address_ready_max = address_ready_max.max(cycle_depend);
            } else if !self.rob.find(producer)?.is_done_set() {
                resolved = false;
            }
        }

        let dep = self.rob.find_mut(dep_seq)?;
        dep.address_ready_max = address_ready_max;
        if resolved {
            dep.address_ready = address_ready_max;
        }
        Ok(())
    }

    /// Memory-level parallelism bookkeeping for a load that just issued.
    fn account_long_latency_load(&mut self, pos: usize) {
        let now = self.now;
        let Some(entry) = self.rob.get(pos) else {
            return;
        };
        let uop = entry.uop();
        if !uop.is_long_latency_load() || uop.dcache_hit_where() == HitWhere::L1Own {
            return;
        }

        if self.last_accounted_memory_cycle < now {
            self.last_accounted_memory_cycle = now;
        }
        let done = entry.done.max(now);
        self.stats.outstanding_long_latency_insns += done.saturating_since(now).get();
        // Only cycles not already covered by an overlapping miss.
        if done > self.last_accounted_memory_cycle {
            self.stats.outstanding_long_latency_cycles +=
                done.saturating_since(self.last_accounted_memory_cycle).get();
            self.last_accounted_memory_cycle = done;
        }
    }
}
