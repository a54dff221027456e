//! Skip-ahead clock driver.
//!
//! Each pass runs dispatch, issue and commit once, then moves the clock to the
//! earliest cycle at which any of them reported possible progress. Cycles in
//! between cannot change a scheduling decision, so skipping them gives the
//! same retirement times as stepping one cycle at a time.

use tracing::trace;

use super::RobEngine;
use crate::common::{Cycle, SchedulerError};
use crate::core::uop::HitWhere;

impl RobEngine {
    /// Runs one scheduling pass.
    ///
    /// Unless `draining`, returns zero latency without doing anything when the
    /// front end could run but fewer than two dispatch groups are staged.
    pub(super) fn execute(&mut self, draining: bool) -> Result<(u64, Cycle), SchedulerError> {
        let now = self.now;
        if !draining
            && self.frontend_stalled_until <= now
            && self.rob.len() < self.num_in_rob + 2 * self.config.dispatch_width
        {
            return Ok((0, Cycle::ZERO));
        }

        let (next_dispatch, component) = self.do_dispatch();
        let next_issue = self.do_issue()?;
        let (instructions, next_commit) = self.do_commit();

        let next_event = next_dispatch.min(next_issue).min(next_commit);
        let skip = if self.config.skip_ahead && !next_event.is_infinite() && next_event > now + 1 {
            next_event.saturating_since(now).get()
        } else {
            1
        };

        if cfg!(any(debug_assertions, feature = "always-trace")) && tracing::enabled!(tracing::Level::TRACE) {
            trace!(rob = %self.dump_rob(), "pass");
        }
        trace!(
            now = now.get(),
            next_dispatch = %next_dispatch,
            next_issue = %next_issue,
            next_commit = %next_commit,
            skip,
            "advance"
        );

        // Loads outstanding now stay outstanding until at least the next event.
        if self.stats.outstanding_loads.is_some() {
            self.count_outstanding_loads(skip);
        }

        self.now += skip;
        self.stats.cycles += skip;
        self.stats.time_skipped += skip - 1;
        self.stats.instructions_committed += instructions;
        self.stats.cpi.add(component, skip);

        Ok((instructions, Cycle(skip)))
    }

    /// Charges the `cycles` starting at the current time to the outstanding-load
    /// histograms.
    fn count_outstanding_loads(&mut self, cycles: u64) {
        let now = self.now;
        let mut counts = [0usize; HitWhere::COUNT];
        for entry in self.rob.iter().take(self.num_in_rob) {
            if entry.is_done_set() && entry.done > now && entry.uop().uop().is_load() {
                counts[entry.uop().dcache_hit_where().index()] += 1;
            }
        }
        if let Some(hist) = self.stats.outstanding_loads.as_mut() {
            hist.record(&counts, cycles);
        }
    }
}
