//! Configuration system for the APEX simulator.
//!
//! This module defines all configuration structures used to parameterize
//! the engine. It provides:
//! 1. **Defaults:** the structural sizes from the design spec (N_PHYS,
//!    ROB/IQ/LSQ/BQ capacity, BTB slots, data memory size).
//! 2. **Structures:** hierarchical config for general run behavior and
//!    core structural sizes.
//!
//! Configuration is supplied via an optional JSON sidecar file (`--config`)
//! or `Config::default()` for a plain CLI invocation.

use serde::Deserialize;

use crate::common::constants;

/// Default configuration constants for the simulator.
mod defaults {
    use crate::common::constants;

    /// Starting program counter: the first instruction's code address.
    pub const START_PC: i64 = constants::CODE_BASE_ADDRESS;
}

/// Top-level simulator configuration.
///
/// # Examples
///
/// ```
/// use apex_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.core.n_phys, 24);
/// assert_eq!(config.core.rob_capacity, 32);
///
/// let json = r#"{"general": {"trace": true}, "core": {"n_phys": 32}}"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert!(config.general.trace);
/// assert_eq!(config.core.n_phys, 32);
/// assert_eq!(config.core.rob_capacity, 32);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General run behavior.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Structural sizes of the engine's internal queues and tables.
    #[serde(default)]
    pub core: CoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            core: CoreConfig::default(),
        }
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Enable per-stage `tracing` events (stalls, retires, mispredicts, and
    /// with `always-trace`, every stage every tick).
    #[serde(default)]
    pub trace: bool,

    /// Initial program counter.
    #[serde(default = "GeneralConfig::default_start_pc")]
    pub start_pc: i64,
}

impl GeneralConfig {
    fn default_start_pc() -> i64 {
        defaults::START_PC
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            start_pc: defaults::START_PC,
        }
    }
}

/// Structural sizes of the engine's internal queues and tables.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Architectural register count.
    #[serde(default = "CoreConfig::default_n_arch")]
    pub n_arch: usize,
    /// Physical register count.
    #[serde(default = "CoreConfig::default_n_phys")]
    pub n_phys: usize,
    /// Issue queue capacity.
    #[serde(default = "CoreConfig::default_iq_capacity")]
    pub iq_capacity: usize,
    /// Reorder buffer capacity.
    #[serde(default = "CoreConfig::default_rob_capacity")]
    pub rob_capacity: usize,
    /// Load/store queue capacity.
    #[serde(default = "CoreConfig::default_lsq_capacity")]
    pub lsq_capacity: usize,
    /// Branch queue capacity.
    #[serde(default = "CoreConfig::default_bq_capacity")]
    pub bq_capacity: usize,
    /// Number of fully-associative BTB slots.
    #[serde(default = "CoreConfig::default_btb_slots")]
    pub btb_slots: usize,
    /// Size of the flat data memory, in signed-integer cells.
    #[serde(default = "CoreConfig::default_data_memory_size")]
    pub data_memory_size: usize,
}

impl CoreConfig {
    fn default_n_arch() -> usize {
        constants::N_ARCH
    }
    fn default_n_phys() -> usize {
        constants::N_PHYS
    }
    fn default_iq_capacity() -> usize {
        constants::IQ_CAPACITY
    }
    fn default_rob_capacity() -> usize {
        constants::ROB_CAPACITY
    }
    fn default_lsq_capacity() -> usize {
        constants::LSQ_CAPACITY
    }
    fn default_bq_capacity() -> usize {
        constants::BQ_CAPACITY
    }
    fn default_btb_slots() -> usize {
        constants::BTB_SLOTS
    }
    fn default_data_memory_size() -> usize {
        constants::DATA_MEMORY_SIZE
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            n_arch: constants::N_ARCH,
            n_phys: constants::N_PHYS,
            iq_capacity: constants::IQ_CAPACITY,
            rob_capacity: constants::ROB_CAPACITY,
            lsq_capacity: constants::LSQ_CAPACITY,
            bq_capacity: constants::BQ_CAPACITY,
            btb_slots: constants::BTB_SLOTS,
            data_memory_size: constants::DATA_MEMORY_SIZE,
        }
    }
}
