//! Insertion and dependency wiring.

use tracing::warn;

use super::RobEngine;
use crate::common::SchedulerError;
use crate::core::pipeline::rob::RobEntry;
use crate::core::uop::DynamicMicroOp;

impl RobEngine {
    /// Numbers `uop`, wires it to its in-flight producers and appends it to
    /// the staging area behind the window.
    pub(super) fn insert(&mut self, mut uop: DynamicMicroOp) -> Result<(), SchedulerError> {
        let seq = self.next_sequence_number;
        self.next_sequence_number += 1;
        uop.set_numbers(seq, self.next_instruction_number);
        if uop.is_last() {
            self.next_instruction_number += 1;
        }

        let mut entry = RobEntry::new(uop);
        // Anything older than the front has committed.
        let lowest = self.rob.front_seq().unwrap_or(seq);

        if entry.uop().uop().is_store() {
            self.wire_address_producers(&mut entry, lowest)?;
        }

        self.register_deps.set_dependencies(entry.uop_mut(), lowest)?;
        self.memory_deps.set_dependencies(entry.uop_mut(), lowest)?;

        if self.config.store_to_load_forwarding && entry.uop().uop().is_load() {
            self.forward_from_store(&mut entry)?;
        }

        let deps = entry.uop().dependencies().clone();
        let mut nearest: Option<u64> = None;
        for &producer in deps.as_slice() {
            let prod = self.rob.find_mut(producer)?;
            let distance = seq - producer;
            nearest = Some(nearest.map_or(distance, |n| n.min(distance)));
            if prod.is_done_set() {
                entry.ready_max = entry.ready_max.max(prod.done);
                let _ = entry.uop_mut().remove_dependency(producer);
            } else {
                prod.add_dependant(seq);
            }
        }
        self.stats.record_producer_distance(nearest);

        if entry.uop().dependencies().is_empty() {
            entry.ready = entry.ready_max;
        }

        self.count_inserted(entry.uop());
        self.rob.push_back(entry)
    }

    /// Resolves the registers a store's address is computed from.
    ///
    /// Producers that already finished contribute their completion time
    /// directly; the rest become address producers and ordinary dependencies,
    /// so the store is woken when each of them issues.
    fn wire_address_producers(&self, entry: &mut RobEntry, lowest: u64) -> Result<(), SchedulerError> {
        let producers: Vec<u64> = entry
            .uop()
            .uop()
            .address_registers
            .iter()
            .filter_map(|&reg| self.register_deps.peek_producer(reg, lowest))
            .collect();

        for producer in producers {
            let prod = self.rob.find(producer)?;
            if prod.is_done_set() {
                entry.address_ready_max = entry.address_ready_max.max(prod.done);
            } else {
                entry.add_address_producer(producer);
                entry.uop_mut().add_dependency(producer)?;
            }
        }
        if entry.address_producers().is_empty() {
            entry.address_ready = entry.address_ready_max;
        }
        Ok(())
    }

    /// Replaces a load's dependency on the first in-flight store it depends on
    /// by that store's own outstanding producers.
    fn forward_from_store(&self, entry: &mut RobEntry) -> Result<(), SchedulerError> {
        let deps = entry.uop().dependencies().clone();
        for &producer in deps.as_slice() {
            let prod = self.rob.find(producer)?;
            if !prod.uop().uop().is_store() {
                continue;
            }
            let store_deps = prod.uop().dependencies().clone();
            let _ = entry.uop_mut().remove_dependency(producer);
            for &upstream in store_deps.as_slice() {
                entry.uop_mut().add_dependency(upstream)?;
            }
            // Producers the store already saw resolve still bound the data.
            entry.ready_max = entry.ready_max.max(prod.ready_max);
            break;
        }
        Ok(())
    }

    fn count_inserted(&mut self, uop: &DynamicMicroOp) {
        let template = uop.uop();
        let stats = &mut self.stats;
        stats.uop_type_count[template.subtype.index()] += 1;
        stats.uops_total += 1;
        if template.is_last {
            stats.insns_total += 1;
        }
        if template.is_x87 {
            stats.uops_x87 += 1;
        }
        if template.is_pause {
            stats.uops_pause += 1;
        }
        if !self.x87_warned && stats.uops_total > 10_000 && stats.uops_x87 > stats.uops_total / 20 {
            self.x87_warned = true;
            warn!(
                uops_total = stats.uops_total,
                uops_x87 = stats.uops_x87,
                "significant fraction of x87 micro-ops, timing accuracy will be low"
            );
        }
    }
}
