// crates/pipeline-collector-config/src/config.rs
// ============================================================================
// Module: Pipeline Collector Configuration
// Description: Configuration loading and validation for the collector.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: pipeline-collector-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section except `[object_store]` has defaults. Two environment
//! variables may relocate the audit trail after the file is parsed; they win
//! over file values when set to a non-empty string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use pipeline_collector_core::AuditLimits;
use pipeline_collector_core::CollectionSettings;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "pipeline-collector.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "PIPELINE_COLLECTOR_CONFIG";
/// Environment variable overriding the audit directory.
pub const AUDIT_DIR_ENV_VAR: &str = "PIPELINE_RUN_LOG_DIR";
/// Environment variable overriding the audit file name.
pub const AUDIT_FILE_ENV_VAR: &str = "PIPELINE_RUN_LOG_FILE";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default audit directory.
const DEFAULT_AUDIT_DIRECTORY: &str = "/var/log";
/// Default audit file name.
const DEFAULT_AUDIT_FILE_NAME: &str = "build.log";
/// Default audit file size before rotation, in megabytes.
const DEFAULT_AUDIT_MAX_SIZE_MB: u64 = 256;
/// Default retention of rotated audit files, in days.
const DEFAULT_AUDIT_MAX_AGE_DAYS: u64 = 7;
/// Default number of rotated audit files kept.
const DEFAULT_AUDIT_MAX_BACKUPS: usize = 7;
/// Default signed URL validity (30 days).
const DEFAULT_URL_EXPIRY_SECS: u64 = 60 * 60 * 24 * 30;
/// Maximum signed URL validity accepted in config (one year).
pub(crate) const MAX_URL_EXPIRY_SECS: u64 = 60 * 60 * 24 * 365;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Pipeline collector configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Object storage for persisted logs and snapshots.
    pub object_store: ObjectStoreConfig,
    /// Local audit trail configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Collection tunables.
    #[serde(default)]
    pub collection: CollectionConfig,
}

impl CollectorConfig {
    /// Loads configuration from disk using the default resolution rules and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.apply_env_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies audit location overrides looked up through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(directory) = lookup(AUDIT_DIR_ENV_VAR).filter(|value| !value.is_empty()) {
            self.audit.directory = directory;
        }
        if let Some(file_name) = lookup(AUDIT_FILE_ENV_VAR).filter(|value| !value.is_empty()) {
            self.audit.file_name = file_name;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.object_store.validate()?;
        self.audit.validate()?;
        self.collection.validate()?;
        Ok(())
    }
}

/// Supported object-store providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreProvider {
    /// Amazon S3 compatible object storage.
    S3,
}

/// Object-store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Provider selection for the object store.
    pub provider: ObjectStoreProvider,
    /// Bucket receiving logs and snapshots.
    pub bucket: String,
    /// Optional region (defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional object-store endpoint (S3-compatible).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional key prefix inside the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Force path-style addressing (S3-compatible).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl ObjectStoreConfig {
    /// Validates object-store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when object-store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("object_store.bucket must be set".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "object_store.endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "object_store.endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        if let Some(prefix) = &self.prefix {
            validate_object_store_prefix(prefix)?;
        }
        Ok(())
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Directory holding the active audit file and its backups.
    #[serde(default = "default_audit_directory")]
    pub directory: String,
    /// Active audit file name.
    #[serde(default = "default_audit_file_name")]
    pub file_name: String,
    /// Size in megabytes at which the active file is rotated.
    #[serde(default = "default_audit_max_size_mb")]
    pub max_size_mb: u64,
    /// Age in days after which rotated files are removed.
    #[serde(default = "default_audit_max_age_days")]
    pub max_age_days: u64,
    /// Number of rotated files kept.
    #[serde(default = "default_audit_max_backups")]
    pub max_backups: usize,
    /// Stamp rotated file names with local time instead of UTC.
    #[serde(default = "default_true")]
    pub local_time: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            directory: default_audit_directory(),
            file_name: default_audit_file_name(),
            max_size_mb: DEFAULT_AUDIT_MAX_SIZE_MB,
            max_age_days: DEFAULT_AUDIT_MAX_AGE_DAYS,
            max_backups: DEFAULT_AUDIT_MAX_BACKUPS,
            local_time: true,
        }
    }
}

impl AuditConfig {
    /// Returns the path of the active audit file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        Path::new(self.directory.trim()).join(self.file_name.trim())
    }

    /// Returns the rotation size threshold in bytes.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    /// Returns the retention period of rotated files.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days.saturating_mul(60 * 60 * 24))
    }

    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("audit.directory", &self.directory)?;
        validate_path_string("audit.file_name", &self.file_name)?;
        let mut components = Path::new(self.file_name.trim()).components();
        if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
            return Err(ConfigError::Invalid(
                "audit.file_name must be a single file name".to_string(),
            ));
        }
        if self.max_size_mb == 0 {
            return Err(ConfigError::Invalid("audit.max_size_mb must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Collection tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    /// Validity of signed URLs in seconds.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
    /// Audit lines at or above this size are truncated.
    #[serde(default = "default_audit_limit_bytes")]
    pub audit_limit_bytes: usize,
    /// Bytes kept from the start of a truncated audit line.
    #[serde(default = "default_audit_slice_bytes")]
    pub audit_head_bytes: usize,
    /// Bytes kept from the end of a truncated audit line.
    #[serde(default = "default_audit_slice_bytes")]
    pub audit_tail_bytes: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            url_expiry_secs: DEFAULT_URL_EXPIRY_SECS,
            audit_limit_bytes: default_audit_limit_bytes(),
            audit_head_bytes: default_audit_slice_bytes(),
            audit_tail_bytes: default_audit_slice_bytes(),
        }
    }
}

impl CollectionConfig {
    /// Converts the config into collector settings.
    #[must_use]
    pub const fn settings(&self) -> CollectionSettings {
        CollectionSettings {
            url_expiry: Duration::from_secs(self.url_expiry_secs),
            audit_limits: AuditLimits {
                limit: self.audit_limit_bytes,
                head: self.audit_head_bytes,
                tail: self.audit_tail_bytes,
            },
        }
    }

    /// Validates collection tunables.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.url_expiry_secs == 0 {
            return Err(ConfigError::Invalid(
                "collection.url_expiry_secs must be greater than zero".to_string(),
            ));
        }
        if self.url_expiry_secs > MAX_URL_EXPIRY_SECS {
            return Err(ConfigError::Invalid(format!(
                "collection.url_expiry_secs must be at most {MAX_URL_EXPIRY_SECS}"
            )));
        }
        let kept = self.audit_head_bytes.saturating_add(self.audit_tail_bytes);
        if kept >= self.audit_limit_bytes {
            return Err(ConfigError::Invalid(
                "collection.audit_head_bytes + audit_tail_bytes must be below audit_limit_bytes"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the object-store prefix string.
fn validate_object_store_prefix(value: &str) -> Result<(), ConfigError> {
    normalize_object_store_prefix(value).map(|_| ())
}

/// Normalizes an object-store key prefix to the empty string or a relative
/// path ending in a single `/`. A blank prefix means no prefix.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for absolute, traversing, backslashed, or
/// over-long prefixes.
pub fn normalize_object_store_prefix(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains('\\') {
        return Err(ConfigError::Invalid(
            "object_store.prefix must not contain backslashes".to_string(),
        ));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("object_store.prefix exceeds max length".to_string()));
    }
    if trimmed.starts_with('/') {
        return Err(ConfigError::Invalid("object_store.prefix must be relative".to_string()));
    }
    let normalized = trimmed.strip_suffix('/').unwrap_or(trimmed);
    for component in Path::new(normalized).components() {
        match component {
            Component::Normal(value) => {
                if value.to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
                    return Err(ConfigError::Invalid(
                        "object_store.prefix segment too long".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::Invalid(
                    "object_store.prefix must be relative without traversal".to_string(),
                ));
            }
        }
    }
    Ok(format!("{normalized}/"))
}

/// Default audit directory.
fn default_audit_directory() -> String {
    DEFAULT_AUDIT_DIRECTORY.to_string()
}

/// Default audit file name.
fn default_audit_file_name() -> String {
    DEFAULT_AUDIT_FILE_NAME.to_string()
}

/// Default audit rotation size in megabytes.
const fn default_audit_max_size_mb() -> u64 {
    DEFAULT_AUDIT_MAX_SIZE_MB
}

/// Default audit retention in days.
const fn default_audit_max_age_days() -> u64 {
    DEFAULT_AUDIT_MAX_AGE_DAYS
}

/// Default number of audit backups.
const fn default_audit_max_backups() -> usize {
    DEFAULT_AUDIT_MAX_BACKUPS
}

/// Serde default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

/// Default signed URL validity in seconds.
const fn default_url_expiry_secs() -> u64 {
    DEFAULT_URL_EXPIRY_SECS
}

/// Default audit truncation limit.
const fn default_audit_limit_bytes() -> usize {
    pipeline_collector_core::runtime::DEFAULT_AUDIT_LIMIT_BYTES
}

/// Default audit head and tail size.
const fn default_audit_slice_bytes() -> usize {
    pipeline_collector_core::runtime::DEFAULT_AUDIT_SLICE_BYTES
}

// ============================================================================
// SECTION: Tests
// ============================================================================
