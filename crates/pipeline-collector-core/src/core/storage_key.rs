// crates/pipeline-collector-core/src/core/storage_key.rs
// ============================================================================
// Module: Storage Keys
// Description: Deterministic object-store keys for run snapshots and logs.
// Purpose: Place every persisted object by month, kind, application, and cluster.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Keys have the layout
//! `<YYYYMM>/<kind>/<application>-<applicationID>/<cluster>-<clusterID>/<run>`.
//! The month segment buckets objects for storage lifecycle rules; two runs
//! with the same identifying fields in the same month share a key and the
//! later write wins. Keys never depend on whether the object exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::metadata::RunMetadata;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Kind of object persisted for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// JSON snapshot envelope of the run.
    Snapshot,
    /// Merged run log text.
    Log,
}

impl ObjectKind {
    /// Returns the key segment for the kind.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Snapshot => "pr",
            Self::Log => "pr-log",
        }
    }
}

/// Object-store key for a persisted run object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Wraps an existing key string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SECTION: Key Derivation
// ============================================================================

/// Computes the storage key for a run object.
#[must_use]
pub fn compute_key(kind: ObjectKind, metadata: &RunMetadata, now: OffsetDateTime) -> StorageKey {
    let month = u8::from(now.month());
    StorageKey(format!(
        "{year:04}{month:02}/{segment}/{application}-{application_id}/{cluster}-{cluster_id}/{run}",
        year = now.year(),
        segment = kind.segment(),
        application = metadata.application,
        application_id = metadata.application_id,
        cluster = metadata.cluster,
        cluster_id = metadata.cluster_id,
        run = metadata.pipeline_run.name,
    ))
}
