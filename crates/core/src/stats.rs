//! Scheduler statistics collection and reporting.
//!
//! Each engine owns one [`RobStats`]; nothing is shared between engines. It
//! tracks:
//! 1. **Time:** Elapsed and skipped cycles, retired instructions.
//! 2. **Micro-op mix:** Counts by subtype, x87 and pause micro-ops.
//! 3. **CPI stack:** Every elapsed cycle attributed to exactly one [`CpiComponent`].
//! 4. **Memory:** Load/store counts and latencies, memory-level parallelism,
//!    optional outstanding-load histograms.
//! 5. **Dependencies:** Producer-distance histogram and consumer count.

use crate::core::uop::{HitWhere, UopSubtype};

/// Histogram buckets for outstanding-load counts.
pub const MAX_OUTSTANDING: usize = 32;

/// What a stalled (or productive) cycle is charged to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CpiComponent {
    /// Useful work.
    Base,
    /// Front end refilling after a mispredicted branch.
    BranchPredictor,
    /// Waiting for a serializing instruction or fence.
    Serialization,
    /// Reservation stations full.
    RsFull,
    /// Instruction fetch missed, by level.
    InstructionCache(HitWhere),
    /// Data access outstanding at the head, by level.
    DataCache(HitWhere),
}

/// Cycles charged to each [`CpiComponent`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpiStack {
    /// Useful work.
    pub base: u64,
    /// Branch misprediction recovery.
    pub branch_predictor: u64,
    /// Serializing instructions and fences.
    pub serialization: u64,
    /// Reservation stations full.
    pub rs_full: u64,
    /// Instruction-cache misses by level.
    pub instruction_cache: [u64; HitWhere::COUNT],
    /// Data-cache stalls by level.
    pub data_cache: [u64; HitWhere::COUNT],
}

impl CpiStack {
    /// Charges `cycles` to `component`.
    pub const fn add(&mut self, component: CpiComponent, cycles: u64) {
        let slot = match component {
            CpiComponent::Base => &mut self.base,
            CpiComponent::BranchPredictor => &mut self.branch_predictor,
            CpiComponent::Serialization => &mut self.serialization,
            CpiComponent::RsFull => &mut self.rs_full,
            CpiComponent::InstructionCache(h) => &mut self.instruction_cache[h.index()],
            CpiComponent::DataCache(h) => &mut self.data_cache[h.index()],
        };
        *slot += cycles;
    }

    /// Cycles charged to `component`.
    pub const fn get(&self, component: CpiComponent) -> u64 {
        match component {
            CpiComponent::Base => self.base,
            CpiComponent::BranchPredictor => self.branch_predictor,
            CpiComponent::Serialization => self.serialization,
            CpiComponent::RsFull => self.rs_full,
            CpiComponent::InstructionCache(h) => self.instruction_cache[h.index()],
            CpiComponent::DataCache(h) => self.data_cache[h.index()],
        }
    }

    /// Sum over all components.
    pub fn total(&self) -> u64 {
        self.base
            + self.branch_predictor
            + self.serialization
            + self.rs_full
            + self.instruction_cache.iter().sum::<u64>()
            + self.data_cache.iter().sum::<u64>()
    }
}

/// Time spent with a given number of loads outstanding, per hit level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MlpHistogram {
    /// `per_level[h][n]`: cycles with `n` loads hitting at level `h` outstanding.
    pub per_level: [[u64; MAX_OUTSTANDING]; HitWhere::COUNT],
    /// `all[n]`: cycles with `n` loads outstanding in total.
    pub all: [u64; MAX_OUTSTANDING],
}

impl Default for MlpHistogram {
    fn default() -> Self {
        Self {
            per_level: [[0; MAX_OUTSTANDING]; HitWhere::COUNT],
            all: [0; MAX_OUTSTANDING],
        }
    }
}

impl MlpHistogram {
    /// Adds `cycles` for the given per-level counts.
    pub fn record(&mut self, counts: &[usize; HitWhere::COUNT], cycles: u64) {
        let bucket = |n: usize| n.min(MAX_OUTSTANDING - 1);
        for (level, &n) in counts.iter().enumerate() {
            if n > 0 {
                self.per_level[level][bucket(n)] += cycles;
            }
        }
        let total: usize = counts.iter().sum();
        if total > 0 {
            self.all[bucket(total)] += cycles;
        }
    }
}

/// Per-engine scheduler metrics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RobStats {
    /// Cycles advanced by scheduling passes.
    pub cycles: u64,
    /// Instructions retired.
    pub instructions_committed: u64,
    /// Cycles jumped over by skip-ahead.
    pub time_skipped: u64,

    /// Micro-ops inserted, by subtype.
    pub uop_type_count: [u64; UopSubtype::COUNT],
    /// Instructions inserted.
    pub insns_total: u64,
    /// Micro-ops inserted.
    pub uops_total: u64,
    /// x87 micro-ops inserted.
    pub uops_x87: u64,
    /// Pause micro-ops inserted.
    pub uops_pause: u64,

    /// Serializing micro-ops issued.
    pub num_serialization_insns: u64,
    /// Cycles serializing micro-ops waited between dispatch and issue.
    pub total_serialization_latency: u64,
    /// Fences issued.
    pub num_mfence_insns: u64,
    /// Cycles fences waited between dispatch and issue.
    pub total_mfence_latency: u64,
    /// Load execution cycles overlapped with older retirements.
    pub total_hidden_dcache_latency: u64,

    /// Loads issued.
    pub loads_count: u64,
    /// Summed load execution latency.
    pub loads_latency: u64,
    /// Stores issued.
    pub stores_count: u64,
    /// Summed store execution latency.
    pub stores_latency: u64,

    /// Sum of nearest-producer distances.
    pub total_producer_ins_distance: u64,
    /// Micro-ops wired (each counted once).
    pub total_consumers: u64,
    /// Histogram of nearest-producer distance; bucket 0 means no producer in flight.
    pub producer_ins_distance: Vec<u64>,

    /// Summed outstanding time of long-latency loads.
    pub outstanding_long_latency_insns: u64,
    /// Cycles with at least one long-latency load outstanding.
    pub outstanding_long_latency_cycles: u64,
    /// Outstanding-load histograms, when enabled.
    pub outstanding_loads: Option<MlpHistogram>,

    /// CPI stack.
    pub cpi: CpiStack,
}

impl RobStats {
    /// Empty metrics for a window of `window_size` entries.
    pub fn new(window_size: usize, mlp_histogram: bool) -> Self {
        Self {
            cycles: 0,
            instructions_committed: 0,
            time_skipped: 0,
            uop_type_count: [0; UopSubtype::COUNT],
            insns_total: 0,
            uops_total: 0,
            uops_x87: 0,
            uops_pause: 0,
            num_serialization_insns: 0,
            total_serialization_latency: 0,
            num_mfence_insns: 0,
            total_mfence_latency: 0,
            total_hidden_dcache_latency: 0,
            loads_count: 0,
            loads_latency: 0,
            stores_count: 0,
            stores_latency: 0,
            total_producer_ins_distance: 0,
            total_consumers: 0,
            producer_ins_distance: vec![0; window_size.max(1)],
            outstanding_long_latency_insns: 0,
            outstanding_long_latency_cycles: 0,
            outstanding_loads: mlp_histogram.then(MlpHistogram::default),
            cpi: CpiStack::default(),
        }
    }

    /// Records the nearest in-flight producer of a newly wired micro-op.
    pub fn record_producer_distance(&mut self, distance: Option<u64>) {
        self.total_consumers += 1;
        let last = self.producer_ins_distance.len() - 1;
        match distance {
            Some(d) => {
                self.total_producer_ins_distance += d;
                let bucket = usize::try_from(d).map_or(last, |d| d.min(last));
                self.producer_ins_distance[bucket] += 1;
            }
            None => self.producer_ins_distance[0] += 1,
        }
    }

    /// Average overlapping long-latency loads while any is outstanding.
    pub fn mlp(&self) -> f64 {
        if self.outstanding_long_latency_cycles == 0 {
            0.0
        } else {
            self.outstanding_long_latency_insns as f64 / self.outstanding_long_latency_cycles as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an
    /// empty slice to print all sections.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles.max(1);
        let instr = self.instructions_committed.max(1);

        if want("summary") {
            println!("\n==========================================================");
            println!("ROB TIMING CORE STATISTICS");
            println!("==========================================================");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_insts                {}", self.instructions_committed);
            println!("sim_ipc                  {:.4}", self.instructions_committed as f64 / cyc as f64);
            println!("sim_cpi                  {:.4}", cyc as f64 / instr as f64);
            println!(
                "time_skipped             {} ({:.2}%)",
                self.time_skipped,
                (self.time_skipped as f64 / cyc as f64) * 100.0
            );
            println!("----------------------------------------------------------");
        }
        if want("cpi") {
            let line = |name: &str, v: u64| {
                println!(
                    "  cpi.{:<20} {:<10} ({:.4})",
                    name,
                    v,
                    v as f64 / instr as f64
                );
            };
            println!("CPI STACK");
            line("base", self.cpi.base);
            line("branch_predictor", self.cpi.branch_predictor);
            line("serialization", self.cpi.serialization);
            line("rs_full", self.cpi.rs_full);
            for h in HitWhere::ALL {
                if self.cpi.instruction_cache[h.index()] > 0 {
                    line(&format!("icache.{h}"), self.cpi.instruction_cache[h.index()]);
                }
                if self.cpi.data_cache[h.index()] > 0 {
                    line(&format!("dcache.{h}"), self.cpi.data_cache[h.index()]);
                }
            }
            println!("----------------------------------------------------------");
        }
        if want("uop_mix") {
            let total = self.uops_total.max(1) as f64;
            println!("MICRO-OP MIX");
            for subtype in UopSubtype::ALL {
                let n = self.uop_type_count[subtype.index()];
                println!(
                    "  uop.{:<19} {} ({:.2}%)",
                    subtype.name(),
                    n,
                    (n as f64 / total) * 100.0
                );
            }
            println!("  uops_total             {}", self.uops_total);
            println!("  insns_total            {}", self.insns_total);
            println!("  uops_x87               {}", self.uops_x87);
            println!("  uops_pause             {}", self.uops_pause);
            println!("  serialization          {} ({} cycles)", self.num_serialization_insns, self.total_serialization_latency);
            println!("  mfence                 {} ({} cycles)", self.num_mfence_insns, self.total_mfence_latency);
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            let avg = |sum: u64, n: u64| if n == 0 { 0.0 } else { sum as f64 / n as f64 };
            println!("MEMORY");
            println!("  loads                  {} (avg {:.2} cycles)", self.loads_count, avg(self.loads_latency, self.loads_count));
            println!("  stores                 {} (avg {:.2} cycles)", self.stores_count, avg(self.stores_latency, self.stores_count));
            println!("  hidden_dcache_latency  {}", self.total_hidden_dcache_latency);
            println!("  mlp                    {:.4}", self.mlp());
            if let Some(hist) = &self.outstanding_loads {
                let busy: Vec<String> = hist
                    .all
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c > 0)
                    .map(|(n, c)| format!("{n}:{c}"))
                    .collect();
                println!("  outstanding_loads      {}", busy.join(" "));
            }
            println!("----------------------------------------------------------");
        }
        if want("dependencies") {
            println!("DEPENDENCIES");
            println!("  consumers              {}", self.total_consumers);
            println!(
                "  avg_producer_distance  {:.2}",
                self.total_producer_ins_distance as f64 / self.total_consumers.max(1) as f64
            );
            println!("  no_producer_in_window  {}", self.producer_ins_distance[0]);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

/// Section names accepted by [`RobStats::print_sections`].
pub const STATS_SECTIONS: &[&str] = &["summary", "cpi", "uop_mix", "memory", "dependencies"];
