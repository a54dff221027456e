//! Commit stage.

use tracing::trace;

use super::RobEngine;
use crate::common::Cycle;
use crate::core::tracer::UopTimes;

impl RobEngine {
    /// Retires finished micro-ops from the head, at most `commit_width` per cycle.
    ///
    /// Returns the number of instructions completed and the next cycle at which
    /// commit (or a dispatch unblocked by it) can make progress.
    pub(super) fn do_commit(&mut self) -> (u64, Cycle) {
        let now = self.now;
        let mut instructions = 0;
        let mut committed = 0;

        while self.rob.front().is_some_and(|front| front.done <= now) {
            let Some(entry) = self.rob.pop_front() else {
                break;
            };
            self.num_in_rob -= 1;

            let times = UopTimes {
                dispatched: entry.dispatched,
                issued: entry.issued,
                done: entry.done,
                commit: now,
            };
            self.tracer.trace_instruction(entry.uop(), &times);

            if entry.uop().uop().is_load() {
                // Execution that overlapped with older work still retiring.
                let at_head = self.last_commit.max(entry.dispatched).max(entry.issued);
                let exposed = entry.done.saturating_since(at_head);
                let total = entry.done.saturating_since(entry.issued);
                self.stats.total_hidden_dcache_latency += total.saturating_since(exposed).get();
            }
            if entry.uop().is_last() {
                instructions += 1;
            }
            self.last_commit = now;
            trace!(seq = entry.seq(), "commit");
            drop(entry);

            committed += 1;
            if committed == self.config.commit_width {
                break;
            }
        }

        let mut next_event = self.rob.front().map_or(Cycle::INFINITE, |front| front.done);

        // A slot freed in a full window lets dispatch resume once the front end allows it.
        let staged = self.rob.len() > self.num_in_rob;
        if committed > 0 && staged {
            next_event = next_event.min(self.frontend_stalled_until.max(now + 1));
        }

        (instructions, next_event)
    }
}
