//! # Configuration Tests
//!
//! Defaults, JSON loading (strings and files) and rejection of impossible machines.

use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::rstest;
use sisd_core::common::ConfigError;
use sisd_core::config::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.clocks.core, 12);
    assert_eq!(config.clocks.instruction_memory, 4);
    assert_eq!(config.clocks.working_memory, 2);
    assert_eq!(config.registers.count, 16);
    assert_eq!(config.registers.zero_register, Some(0));
    assert_eq!(config.registers.word_modulus, 1 << 16);
    assert_eq!(config.memory_size(), 64);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.lines, 4);
    assert_eq!(config.buffer.capacity, 32);
    assert_eq!(config.generator.max_sequence_length, 4);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = Config::from_json(r#"{ "memory": { "banks": 2 } }"#).unwrap();
    assert_eq!(config.memory.banks, 2);
    assert_eq!(config.memory.bank_size, MemoryConfig::default().bank_size);
    assert_eq!(config.clocks, ClockConfig::default());
    assert_eq!(config.generator, GeneratorConfig::default());
}

#[test]
fn test_json_round_trip_of_defaults() {
    let text = serde_json::to_string(&Config::default()).unwrap();
    assert_eq!(Config::from_json(&text).unwrap(), Config::default());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "general": {{ "seed": 99 }}, "registers": {{ "delay": 1 }} }}"#
    )
    .unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.general.seed, 99);
    assert_eq!(config.registers.delay, 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Config::from_json(r#"{ "clocks": 3 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[rstest]
#[case::zero_clock(r#"{ "clocks": { "core": 0 } }"#)]
#[case::supplier_above_a_third(r#"{ "clocks": { "instruction_memory": 5 } }"#)]
#[case::probability_out_of_range(r#"{ "generator": { "branch_probability": 1.5 } }"#)]
#[case::probabilities_over_one(
    r#"{ "generator": { "for_loop_probability": 0.6, "branch_probability": 0.5 } }"#
)]
#[case::zero_register_outside(r#"{ "registers": { "zero_register": 16 } }"#)]
#[case::too_few_registers(r#"{ "registers": { "count": 8 } }"#)]
#[case::buffer_smaller_than_loop(r#"{ "buffer": { "capacity": 8 } }"#)]
#[case::empty_cache(r#"{ "cache": { "enabled": true, "lines": 0 } }"#)]
#[case::no_memory(r#"{ "memory": { "banks": 0 } }"#)]
fn test_impossible_machines_are_rejected(#[case] json: &str) {
    let err = Config::from_json(json).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{json} gave {err}");
}

#[test]
fn test_disabled_cache_may_have_no_lines() {
    let config = Config::from_json(r#"{ "cache": { "enabled": false, "lines": 0 } }"#).unwrap();
    assert!(!config.cache.enabled);
}
