//! Config load validation tests for pipeline-collector-config.
// crates/pipeline-collector-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding) and defaults.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use pipeline_collector_config::CollectorConfig;
use pipeline_collector_config::ObjectStoreProvider;
use tempfile::NamedTempFile;

mod common;

use common::assert_invalid;
use common::load_str;

type TestResult = Result<(), String>;

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        CollectorConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    assert_invalid(
        CollectorConfig::load(Some(Path::new("/nonexistent/pipeline-collector.toml"))),
        "config io error",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'#'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(CollectorConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(CollectorConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_missing_object_store_section() -> TestResult {
    let err = load_str("[audit]\ndirectory = \"/tmp\"\n").err().ok_or("expected failure")?;
    if !err.contains("config parse error") {
        return Err(format!("unexpected error {err}"));
    }
    Ok(())
}

#[test]
fn minimal_config_gets_defaults() -> TestResult {
    let config = load_str(common::MINIMAL_TOML)?;
    assert_eq!(config.object_store.provider, ObjectStoreProvider::S3);
    assert_eq!(config.object_store.bucket, "pipeline-runs");
    assert_eq!(config.audit.max_size_mb, 256);
    assert_eq!(config.audit.max_age_days, 7);
    assert_eq!(config.audit.max_backups, 7);
    assert!(config.audit.local_time);
    assert_eq!(config.collection.url_expiry_secs, 2_592_000);
    assert_eq!(config.collection.audit_limit_bytes, 2_621_440);
    assert_eq!(config.collection.audit_head_bytes, 1_048_576);
    assert_eq!(config.collection.audit_tail_bytes, 1_048_576);
    let settings = config.collection.settings();
    assert_eq!(settings.url_expiry, Duration::from_secs(2_592_000));
    Ok(())
}

#[test]
fn full_config_round_trips_values() -> TestResult {
    let config = load_str(
        r#"
[object_store]
provider = "s3"
bucket = "runs"
region = "eu-west-1"
endpoint = "https://minio.internal:9000"
prefix = "collector/prod"
force_path_style = true

[audit]
directory = "/srv/audit"
file_name = "runs.log"
max_size_mb = 16
max_age_days = 3
max_backups = 2
local_time = false

[collection]
url_expiry_secs = 3600
audit_limit_bytes = 1000
audit_head_bytes = 400
audit_tail_bytes = 400
"#,
    )?;
    assert_eq!(config.object_store.region.as_deref(), Some("eu-west-1"));
    assert!(config.object_store.force_path_style);
    assert!(!config.audit.local_time);
    assert_eq!(config.audit.max_backups, 2);
    let limits = config.collection.settings().audit_limits;
    assert_eq!((limits.limit, limits.head, limits.tail), (1000, 400, 400));
    Ok(())
}

#[test]
fn env_overrides_relocate_audit_file() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.apply_env_overrides(|name| match name {
        "PIPELINE_RUN_LOG_DIR" => Some("/data/audit".to_string()),
        "PIPELINE_RUN_LOG_FILE" => Some("collector.log".to_string()),
        _ => None,
    });
    assert_eq!(config.audit.path(), PathBuf::from("/data/audit/collector.log"));
    Ok(())
}

#[test]
fn empty_env_overrides_are_ignored() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.apply_env_overrides(|_| Some(String::new()));
    assert_eq!(config.audit.path(), PathBuf::from("/var/log/build.log"));
    Ok(())
}
