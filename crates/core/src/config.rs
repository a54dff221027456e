//! Configuration system for the timing core.
//!
//! This module defines all configuration structures used to parameterize an
//! engine. It provides:
//! 1. **Defaults:** Baseline widths, window and queue sizes for a wide out-of-order core.
//! 2. **Structures:** Hierarchical config for the ROB scheduler, issue ports and the default memory model.
//! 3. **Validation:** Rejection of configurations the scheduler cannot run with.
//!
//! Configuration is read once at engine construction and never re-read.

use serde::Deserialize;

use crate::common::ConfigError;

/// Default configuration constants.
///
/// These values describe the baseline core when a field is not present in the
/// JSON configuration.
mod defaults {
    /// Micro-ops dispatched into the window per cycle. Also the issue width
    /// when issue-port contention is not modeled.
    pub const DISPATCH_WIDTH: usize = 4;

    /// Micro-ops retired per cycle.
    pub const COMMIT_WIDTH: usize = 4;

    /// Reorder buffer capacity (active window).
    pub const WINDOW_SIZE: usize = 128;

    /// Reservation station entries shared by all issue-pending micro-ops.
    pub const RS_ENTRIES: usize = 36;

    /// Total front-end refill penalty after a branch misprediction, in cycles.
    pub const MISPREDICTION_PENALTY: u64 = 8;

    /// Outstanding loads tracked by the load queue.
    pub const OUTSTANDING_LOADS: usize = 48;

    /// Outstanding stores tracked by the store queue.
    pub const OUTSTANDING_STORES: usize = 32;

    /// Slots beyond the window that hold inserted but not yet dispatched micro-ops.
    pub const STAGING_MARGIN: usize = 255;

    /// Integer ALU issue ports.
    pub const ALU_PORTS: usize = 3;

    /// Floating-point issue ports.
    pub const FP_PORTS: usize = 2;

    /// Load address-generation ports.
    pub const LOAD_PORTS: usize = 2;

    /// Store ports.
    pub const STORE_PORTS: usize = 1;

    /// Branch units.
    pub const BRANCH_PORTS: usize = 1;

    /// Latency of a light-cache hit, in cycles.
    pub const HIT_LATENCY: u64 = 4;

    /// Latency of a light-cache miss, in cycles.
    pub const MISS_LATENCY: u64 = 100;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use robsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.rob.window_size, 128);
/// assert!(config.rob.skip_ahead);
/// ```
///
/// Deserializing from JSON; omitted fields take their defaults:
///
/// ```
/// use robsim_core::config::Config;
///
/// let json = r#"{
///     "rob": {
///         "dispatch_width": 2,
///         "window_size": 32,
///         "in_order": true,
///         "store_to_load_forwarding": false
///     },
///     "contention": { "alu_ports": 1 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.rob.dispatch_width, 2);
/// assert_eq!(config.rob.commit_width, 4);
/// assert!(config.rob.in_order);
/// assert_eq!(config.contention.alu_ports, 1);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Reorder buffer scheduler parameters.
    #[serde(default)]
    pub rob: RobConfig,
    /// Issue port capacities for the default contention model.
    #[serde(default)]
    pub contention: ContentionConfig,
    /// Latencies of the default memory collaborator.
    #[serde(default)]
    pub memory: MemoryModelConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error reported
    /// by [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a runnable core.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] for any zero width, size or queue depth, and
    /// [`ConfigError::StagingMargin`] when the staging area cannot hold two
    /// dispatch groups.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rob.validate()?;
        self.contention.validate()
    }
}

/// Reorder buffer scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RobConfig {
    /// Micro-ops dispatched per cycle (and issued, without port contention).
    #[serde(default = "RobConfig::default_dispatch_width")]
    pub dispatch_width: usize,

    /// Micro-ops committed per cycle.
    #[serde(default = "RobConfig::default_commit_width")]
    pub commit_width: usize,

    /// Active window (ROB) capacity.
    #[serde(default = "RobConfig::default_window_size")]
    pub window_size: usize,

    /// Reservation station entries.
    #[serde(default = "RobConfig::default_rs_entries")]
    pub rs_entries: usize,

    /// Branch misprediction penalty in cycles.
    #[serde(default = "RobConfig::default_misprediction_penalty")]
    pub misprediction_penalty: u64,

    /// Loads wait for the producers of a forwarding store instead of the store.
    #[serde(default = "RobConfig::default_true")]
    pub store_to_load_forwarding: bool,

    /// When false, a load may not pass a store whose address is unresolved.
    #[serde(default = "RobConfig::default_true")]
    pub address_disambiguation: bool,

    /// Issue strictly in program order.
    #[serde(default)]
    pub in_order: bool,

    /// Load queue depth.
    #[serde(default = "RobConfig::default_outstanding_loads")]
    pub outstanding_loads: usize,

    /// Store queue depth.
    #[serde(default = "RobConfig::default_outstanding_stores")]
    pub outstanding_stores: usize,

    /// Model structural issue-port contention.
    #[serde(default)]
    pub issue_contention: bool,

    /// Jump the clock straight to the next event when the pipeline is idle.
    /// Disabling it evaluates every cycle; results are identical, only slower.
    #[serde(default = "RobConfig::default_true")]
    pub skip_ahead: bool,

    /// Collect outstanding-load histograms.
    #[serde(default)]
    pub mlp_histogram: bool,

    /// Pre-dispatch staging slots beyond the window.
    #[serde(default = "RobConfig::default_staging_margin")]
    pub staging_margin: usize,
}

impl RobConfig {
    fn default_dispatch_width() -> usize {
        defaults::DISPATCH_WIDTH
    }

    fn default_commit_width() -> usize {
        defaults::COMMIT_WIDTH
    }

    fn default_window_size() -> usize {
        defaults::WINDOW_SIZE
    }

    fn default_rs_entries() -> usize {
        defaults::RS_ENTRIES
    }

    fn default_misprediction_penalty() -> u64 {
        defaults::MISPREDICTION_PENALTY
    }

    fn default_outstanding_loads() -> usize {
        defaults::OUTSTANDING_LOADS
    }

    fn default_outstanding_stores() -> usize {
        defaults::OUTSTANDING_STORES
    }

    fn default_staging_margin() -> usize {
        defaults::STAGING_MARGIN
    }

    const fn default_true() -> bool {
        true
    }

    /// Total ring capacity: the window plus the staging margin.
    pub const fn ring_capacity(&self) -> usize {
        self.window_size + self.staging_margin
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("rob.dispatch_width", self.dispatch_width),
            ("rob.commit_width", self.commit_width),
            ("rob.window_size", self.window_size),
            ("rob.rs_entries", self.rs_entries),
            ("rob.outstanding_loads", self.outstanding_loads),
            ("rob.outstanding_stores", self.outstanding_stores),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field });
        }
        if self.staging_margin < 2 * self.dispatch_width {
            return Err(ConfigError::StagingMargin {
                margin: self.staging_margin,
                dispatch_width: self.dispatch_width,
            });
        }
        Ok(())
    }
}

impl Default for RobConfig {
    /// Creates the baseline out-of-order core: 4-wide, 128-entry window,
    /// forwarding and disambiguation on, skip-ahead on.
    fn default() -> Self {
        Self {
            dispatch_width: defaults::DISPATCH_WIDTH,
            commit_width: defaults::COMMIT_WIDTH,
            window_size: defaults::WINDOW_SIZE,
            rs_entries: defaults::RS_ENTRIES,
            misprediction_penalty: defaults::MISPREDICTION_PENALTY,
            store_to_load_forwarding: true,
            address_disambiguation: true,
            in_order: false,
            outstanding_loads: defaults::OUTSTANDING_LOADS,
            outstanding_stores: defaults::OUTSTANDING_STORES,
            issue_contention: false,
            skip_ahead: true,
            mlp_histogram: false,
            staging_margin: defaults::STAGING_MARGIN,
        }
    }
}

/// Issue port capacities per cycle, by port class.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentionConfig {
    /// Integer ALU ports
    #[serde(default = "ContentionConfig::default_alu")]
    pub alu_ports: usize,

    /// Floating-point ports
    #[serde(default = "ContentionConfig::default_fp")]
    pub fp_ports: usize,

    /// Load ports
    #[serde(default = "ContentionConfig::default_load")]
    pub load_ports: usize,

    /// Store ports
    #[serde(default = "ContentionConfig::default_store")]
    pub store_ports: usize,

    /// Branch units
    #[serde(default = "ContentionConfig::default_branch")]
    pub branch_ports: usize,
}

impl ContentionConfig {
    fn default_alu() -> usize {
        defaults::ALU_PORTS
    }

    fn default_fp() -> usize {
        defaults::FP_PORTS
    }

    fn default_load() -> usize {
        defaults::LOAD_PORTS
    }

    fn default_store() -> usize {
        defaults::STORE_PORTS
    }

    fn default_branch() -> usize {
        defaults::BRANCH_PORTS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ports = [
            ("contention.alu_ports", self.alu_ports),
            ("contention.fp_ports", self.fp_ports),
            ("contention.load_ports", self.load_ports),
            ("contention.store_ports", self.store_ports),
            ("contention.branch_ports", self.branch_ports),
        ];
        match ports.iter().find(|(_, v)| *v == 0) {
            Some(&(field, _)) => Err(ConfigError::Zero { field }),
            None => Ok(()),
        }
    }
}

impl Default for ContentionConfig {
    fn default() -> Self {
        Self {
            alu_ports: defaults::ALU_PORTS,
            fp_ports: defaults::FP_PORTS,
            load_ports: defaults::LOAD_PORTS,
            store_ports: defaults::STORE_PORTS,
            branch_ports: defaults::BRANCH_PORTS,
        }
    }
}

/// Latencies of the built-in light-cache memory model.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryModelConfig {
    /// Hit latency in cycles
    #[serde(default = "MemoryModelConfig::default_hit")]
    pub hit_latency: u64,

    /// Miss latency in cycles
    #[serde(default = "MemoryModelConfig::default_miss")]
    pub miss_latency: u64,
}

impl MemoryModelConfig {
    fn default_hit() -> u64 {
        defaults::HIT_LATENCY
    }

    fn default_miss() -> u64 {
        defaults::MISS_LATENCY
    }
}

impl Default for MemoryModelConfig {
    fn default() -> Self {
        Self {
            hit_latency: defaults::HIT_LATENCY,
            miss_latency: defaults::MISS_LATENCY,
        }
    }
}
