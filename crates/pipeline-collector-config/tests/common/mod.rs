// crates/pipeline-collector-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared config fixtures for validation tests.
// Purpose: Provide minimal valid configs and temp-file loaders.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;

use pipeline_collector_config::CollectorConfig;
use pipeline_collector_config::ConfigError;
use tempfile::NamedTempFile;

/// Smallest config accepted by validation.
pub const MINIMAL_TOML: &str = r#"
[object_store]
provider = "s3"
bucket = "pipeline-runs"
"#;

/// Parses the minimal config.
pub fn minimal_config() -> Result<CollectorConfig, ConfigError> {
    CollectorConfig::from_toml(MINIMAL_TOML)
}

/// Writes `content` to a temp file and loads it.
pub fn load_str(content: &str) -> Result<CollectorConfig, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    CollectorConfig::load(Some(file.path())).map_err(|err| err.to_string())
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
