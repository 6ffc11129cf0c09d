//! Configuration loading from TOML files and environment overrides.

use percept_daq::config::{AppConfig, PacketErrorPolicy};
use percept_daq::logging::OutputFormat;
use percept_daq::timing::SequencePolicy;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_toml() {
    let file = write_config(
        r#"
[application]
log_level = "debug"
log_format = "json"

[device]
timezone_offset_secs = -18000.0

[stream]
resync_threshold_secs = 2.5
sequence_policy = "reject"
on_packet_error = "skip"

[output]
include_utc = false
"#,
    );

    let config = AppConfig::load_from(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.application.log_format, OutputFormat::Json);
    assert_eq!(config.device.timezone_offset_secs, -18000.0);
    assert_eq!(config.stream.resync_threshold_secs, 2.5);
    assert_eq!(config.stream.sequence_policy, SequencePolicy::Reject);
    assert_eq!(config.stream.on_packet_error, PacketErrorPolicy::Skip);
    assert!(!config.output.include_utc);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = write_config(
        r#"
[stream]
sequence_policy = "ignore"
"#,
    );

    std::env::set_var("PERCEPT_DAQ_STREAM__SEQUENCE_POLICY", "reject");
    std::env::set_var("PERCEPT_DAQ_DEVICE__TIMEZONE_OFFSET_SECS", "3600.0");
    let result = AppConfig::load_from(file.path());
    std::env::remove_var("PERCEPT_DAQ_STREAM__SEQUENCE_POLICY");
    std::env::remove_var("PERCEPT_DAQ_DEVICE__TIMEZONE_OFFSET_SECS");

    let config = result.unwrap();
    assert_eq!(config.stream.sequence_policy, SequencePolicy::Reject);
    assert_eq!(config.device.timezone_offset_secs, 3600.0);
}

#[test]
#[serial]
fn test_invalid_policy_is_config_error() {
    let file = write_config(
        r#"
[stream]
sequence_policy = "sometimes"
"#,
    );
    assert!(AppConfig::load_from(file.path()).is_err());
}

#[test]
#[serial]
fn test_semantic_validation() {
    let file = write_config(
        r#"
[stream]
resync_threshold_secs = -1.0
"#,
    );
    let config = AppConfig::load_from(file.path()).unwrap();
    assert!(config.validate().is_err());
}
