// crates/pipeline-collector-core/src/core/records.rs
// ============================================================================
// Module: Collection Records
// Description: Snapshot envelopes, audit lines, and collection results.
// Purpose: Define the artifacts produced and consumed around a collection.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! - [`RunSnapshotEnvelope`] is the JSON body of the snapshot object.
//! - [`AuditRecord`] is serialized to a single audit line and never read back.
//! - [`CollectResult`] is handed to the caller once per successful collection.
//! - [`PersistedRun`] is the platform's record of a run, used by the read path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::identifiers::CorrelationId;
use crate::core::metadata::RunMetadata;
use crate::core::run::PipelineRun;
use crate::core::storage_key::StorageKey;

// ============================================================================
// SECTION: Snapshot Envelope
// ============================================================================

/// Persisted snapshot of a run: resolved metadata plus the full definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshotEnvelope {
    /// Metadata resolved at collection time.
    pub metadata: RunMetadata,
    /// Run definition as last observed.
    pub pipeline_run: PipelineRun,
}

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// One audit line describing a collection.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord<'a> {
    /// Snapshot URL and metadata.
    pub object: AuditObject<'a>,
    /// Log URL and content.
    pub log: AuditLog<'a>,
}

/// Snapshot half of an [`AuditRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct AuditObject<'a> {
    /// Signed snapshot URL.
    pub url: &'a str,
    /// Resolved run metadata.
    pub metadata: &'a RunMetadata,
}

/// Log half of an [`AuditRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog<'a> {
    /// Signed log URL.
    pub url: &'a str,
    /// Merged log text.
    pub content: &'a str,
}

impl<'a> AuditRecord<'a> {
    /// Assembles an audit record from both URLs, metadata, and log content.
    #[must_use]
    pub const fn new(
        snapshot_url: &'a str,
        metadata: &'a RunMetadata,
        log_url: &'a str,
        log_content: &'a str,
    ) -> Self {
        Self {
            object: AuditObject {
                url: snapshot_url,
                metadata,
            },
            log: AuditLog {
                url: log_url,
                content: log_content,
            },
        }
    }
}

// ============================================================================
// SECTION: Collect Result
// ============================================================================

/// Outcome of a collection, sourced only from already-resolved metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResult {
    /// Bucket holding both objects.
    pub bucket: String,
    /// Key of the merged log object.
    pub log_object: StorageKey,
    /// Key of the snapshot object.
    pub snapshot_object: StorageKey,
    /// Signed log URL, verbatim from the store.
    pub log_url: String,
    /// Signed snapshot URL, verbatim from the store.
    pub snapshot_url: String,
    /// Run result label.
    pub result: String,
    /// Run start time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    /// Run completion time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_time: Option<OffsetDateTime>,
}

// ============================================================================
// SECTION: Persisted Run
// ============================================================================

/// Platform record of a run, as consulted by the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRun {
    /// Run name.
    pub name: String,
    /// Key of the persisted log, if collected.
    #[serde(default)]
    pub log_object: Option<StorageKey>,
    /// Key of the persisted snapshot, if collected.
    #[serde(default)]
    pub snapshot_object: Option<StorageKey>,
    /// Orchestrator correlation identifier.
    pub correlation_id: CorrelationId,
}

impl PersistedRun {
    /// Returns a record for a run that has not been collected yet.
    #[must_use]
    pub fn live(name: impl Into<String>, correlation_id: impl Into<CorrelationId>) -> Self {
        Self {
            name: name.into(),
            log_object: None,
            snapshot_object: None,
            correlation_id: correlation_id.into(),
        }
    }

    /// Records the object keys from a finished collection.
    #[must_use]
    pub fn with_collected(mut self, result: &CollectResult) -> Self {
        self.log_object = Some(result.log_object.clone());
        self.snapshot_object = Some(result.snapshot_object.clone());
        self
    }
}
