//! Configuration defaults and JSON deserialization.

use apex_core::Config;
use apex_core::common::constants;

#[test]
fn default_matches_structural_constants() {
    let config = Config::default();
    assert!(!config.general.trace);
    assert_eq!(config.general.start_pc, constants::CODE_BASE_ADDRESS);
    assert_eq!(config.core.n_arch, constants::N_ARCH);
    assert_eq!(config.core.n_phys, constants::N_PHYS);
    assert_eq!(config.core.iq_capacity, constants::IQ_CAPACITY);
    assert_eq!(config.core.rob_capacity, constants::ROB_CAPACITY);
    assert_eq!(config.core.lsq_capacity, constants::LSQ_CAPACITY);
    assert_eq!(config.core.bq_capacity, constants::BQ_CAPACITY);
    assert_eq!(config.core.btb_slots, constants::BTB_SLOTS);
    assert_eq!(config.core.data_memory_size, constants::DATA_MEMORY_SIZE);
}

#[test]
fn partial_json_fills_remaining_defaults() {
    let json = r#"{"core": {"rob_capacity": 64, "n_phys": 48}}"#;
    let config: Config = serde_json::from_str(json).expect("valid json");
    assert_eq!(config.core.rob_capacity, 64);
    assert_eq!(config.core.n_phys, 48);
    assert_eq!(config.core.iq_capacity, constants::IQ_CAPACITY);
    assert!(!config.general.trace);
}

#[test]
fn trace_flag_and_custom_start_pc() {
    let json = r#"{"general": {"trace": true, "start_pc": 4096}}"#;
    let config: Config = serde_json::from_str(json).expect("valid json");
    assert!(config.general.trace);
    assert_eq!(config.general.start_pc, 4096);
}

#[test]
fn empty_object_is_all_defaults() {
    let config: Config = serde_json::from_str("{}").expect("valid json");
    assert_eq!(config.core.n_phys, constants::N_PHYS);
    assert_eq!(config.general.start_pc, constants::CODE_BASE_ADDRESS);
}
