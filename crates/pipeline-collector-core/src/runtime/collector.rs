// crates/pipeline-collector-core/src/runtime/collector.rs
// ============================================================================
// Module: Collection Orchestrator
// Description: End-to-end collect-then-delete workflow for finished runs.
// Purpose: Persist a run's log and snapshot before removing the live resource.
// Dependencies: crate::{core, interfaces, runtime}, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`Collector::collect`] runs, in order:
//! 1. metadata resolution,
//! 2. log merge, signed URL, and log put,
//! 3. snapshot signed URL and tagged snapshot put,
//! 4. audit line assembly, truncation, and append,
//! 5. result assembly from the resolved metadata,
//! 6. deletion of the live orchestrator run.
//!
//! Deletion is attempted only after both objects are stored. A run that is
//! already gone counts as deleted, so re-collecting yields the same result.
//! Any other deletion failure is returned even though the artifacts are
//! durable; the caller may retry deletion on its own. No step is retried here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing::debug;
use tracing::info_span;
use tracing::warn;

use crate::core::metadata::PlatformContext;
use crate::core::metadata::RunMetadata;
use crate::core::metadata::resolve_metadata;
use crate::core::records::AuditRecord;
use crate::core::records::CollectResult;
use crate::core::records::RunSnapshotEnvelope;
use crate::core::run::PipelineRun;
use crate::core::storage_key::ObjectKind;
use crate::core::storage_key::StorageKey;
use crate::interfaces::AuditSink;
use crate::interfaces::ObjectTags;
use crate::interfaces::Orchestrator;
use crate::interfaces::OrchestratorError;
use crate::runtime::cancel::with_cancel;
use crate::runtime::error::CollectorError;
use crate::runtime::error::ResourceKind;
use crate::runtime::merge::merge_log_streams;
use crate::runtime::persister::DEFAULT_URL_EXPIRY;
use crate::runtime::persister::ObjectPersister;
use crate::runtime::persister::snapshot_tags;
use crate::runtime::timing::OperationTimer;
use crate::runtime::truncate::AuditLimits;
use crate::runtime::truncate::truncate_middle;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Tunables for a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSettings {
    /// Validity of issued signed URLs.
    pub url_expiry: Duration,
    /// Audit line size bounds.
    pub audit_limits: AuditLimits,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            url_expiry: DEFAULT_URL_EXPIRY,
            audit_limits: AuditLimits::default(),
        }
    }
}

// ============================================================================
// SECTION: Intermediate Results
// ============================================================================

/// Outcome of the log stage.
struct CollectedLog {
    /// Log object key.
    key: StorageKey,
    /// Signed log URL.
    url: String,
    /// Merged log bytes.
    content: Bytes,
}

/// Outcome of the snapshot stage.
struct CollectedSnapshot {
    /// Snapshot object key.
    key: StorageKey,
    /// Signed snapshot URL.
    url: String,
}

// ============================================================================
// SECTION: Collector
// ============================================================================

/// Collects finished runs into object storage and deletes the live resource.
pub struct Collector {
    /// Object-store facade.
    persister: ObjectPersister,
    /// Orchestrator executing runs.
    orchestrator: Arc<dyn Orchestrator>,
    /// Local audit trail.
    audit: Arc<dyn AuditSink>,
    /// Tunables.
    settings: CollectionSettings,
    /// Clock used for the month segment of storage keys.
    clock: fn() -> OffsetDateTime,
}

impl Collector {
    /// Creates a collector with the UTC wall clock.
    #[must_use]
    pub fn new(
        persister: ObjectPersister,
        orchestrator: Arc<dyn Orchestrator>,
        audit: Arc<dyn AuditSink>,
        settings: CollectionSettings,
    ) -> Self {
        Self {
            persister,
            orchestrator,
            audit,
            settings,
            clock: OffsetDateTime::now_utc,
        }
    }

    /// Replaces the clock used for key months.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Collects a finished run and deletes its live orchestrator resource.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] when any stage fails. A
    /// [`CollectorError::OrchestratorDeleteFailed`] means both objects were
    /// stored but the live run still exists.
    pub async fn collect(
        &self,
        run: &PipelineRun,
        context: &PlatformContext,
        cancel: &CancellationToken,
    ) -> Result<CollectResult, CollectorError> {
        let span = info_span!("collect", run = %run.name, namespace = %run.namespace);
        self.collect_inner(run, context, cancel).instrument(span).await
    }

    /// Body of [`Collector::collect`], run inside its span.
    async fn collect_inner(
        &self,
        run: &PipelineRun,
        context: &PlatformContext,
        cancel: &CancellationToken,
    ) -> Result<CollectResult, CollectorError> {
        let _timer = OperationTimer::start("collect");
        let metadata = resolve_metadata(run, context);
        // One timestamp for both keys keeps them in the same month.
        let now = (self.clock)();

        let log = self.collect_log(run, &metadata, now, cancel).await?;
        debug!(log_object = %log.key, log_url = %log.url, "collected log");

        let snapshot = self.collect_snapshot(run, &metadata, now, cancel).await?;
        debug!(snapshot_object = %snapshot.key, snapshot_url = %snapshot.url, "collected snapshot");

        self.append_audit(&metadata, &log, &snapshot)?;

        let summary = &metadata.pipeline_run;
        let result = CollectResult {
            bucket: self.persister.bucket().to_string(),
            log_object: log.key,
            snapshot_object: snapshot.key,
            log_url: log.url,
            snapshot_url: snapshot.url,
            result: summary.result.clone(),
            start_time: summary.start_time,
            completion_time: summary.completion_time,
        };

        match with_cancel(cancel, "delete run", self.orchestrator.delete_run(run)).await? {
            Ok(()) => {
                debug!(
                    pipeline_run_id = context.pipeline_run_id.unwrap_or_default(),
                    "pipeline run deleted"
                );
            }
            Err(OrchestratorError::NotFound(_)) => {
                warn!(run = %run.name, "pipeline run not found when deleted");
            }
            Err(err) => return Err(CollectorError::OrchestratorDeleteFailed(err.to_string())),
        }

        Ok(result)
    }

    /// Merges and stores the run log.
    async fn collect_log(
        &self,
        run: &PipelineRun,
        metadata: &RunMetadata,
        now: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<CollectedLog, CollectorError> {
        let span = info_span!("collect_log", run = %run.name);
        self.collect_log_inner(run, metadata, now, cancel).instrument(span).await
    }

    /// Body of [`Collector::collect_log`], run inside its span.
    async fn collect_log_inner(
        &self,
        run: &PipelineRun,
        metadata: &RunMetadata,
        now: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<CollectedLog, CollectorError> {
        let _timer = OperationTimer::start("collect_log");
        let streams = with_cancel(cancel, "open log stream", self.orchestrator.log_stream(run))
            .await?
            .map_err(|err| match err {
                OrchestratorError::NotFound(message) => {
                    CollectorError::NotFound(ResourceKind::Run, message)
                }
                OrchestratorError::Backend(message) => {
                    CollectorError::OrchestratorGetFailed(message)
                }
            })?;

        let key = self.persister.compute_key(ObjectKind::Log, metadata, now);
        let url = self.persister.issue_url(&key, self.settings.url_expiry, cancel).await?;
        let content = Bytes::from(merge_log_streams(streams, cancel).await?);
        self.persister.put(&key, content.clone(), &ObjectTags::new(), cancel).await?;
        Ok(CollectedLog {
            key,
            url,
            content,
        })
    }

    /// Stores the snapshot envelope with its tags.
    async fn collect_snapshot(
        &self,
        run: &PipelineRun,
        metadata: &RunMetadata,
        now: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<CollectedSnapshot, CollectorError> {
        let span = info_span!("collect_snapshot", run = %run.name);
        self.collect_snapshot_inner(run, metadata, now, cancel).instrument(span).await
    }

    /// Body of [`Collector::collect_snapshot`], run inside its span.
    async fn collect_snapshot_inner(
        &self,
        run: &PipelineRun,
        metadata: &RunMetadata,
        now: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<CollectedSnapshot, CollectorError> {
        let _timer = OperationTimer::start("collect_snapshot");
        let envelope = RunSnapshotEnvelope {
            metadata: metadata.clone(),
            pipeline_run: run.clone(),
        };
        let body = serde_json::to_vec(&envelope)
            .map_err(|err| CollectorError::InvalidParam(err.to_string()))?;

        let key = self.persister.compute_key(ObjectKind::Snapshot, metadata, now);
        let url = self.persister.issue_url(&key, self.settings.url_expiry, cancel).await?;
        self.persister.put(&key, Bytes::from(body), &snapshot_tags(metadata), cancel).await?;
        Ok(CollectedSnapshot {
            key,
            url,
        })
    }

    /// Serializes, truncates, and appends the audit line.
    ///
    /// Append failures are logged and do not fail the collection.
    fn append_audit(
        &self,
        metadata: &RunMetadata,
        log: &CollectedLog,
        snapshot: &CollectedSnapshot,
    ) -> Result<(), CollectorError> {
        let content = String::from_utf8_lossy(&log.content);
        let record = AuditRecord::new(&snapshot.url, metadata, &log.url, &content);
        let line = serde_json::to_vec(&record)
            .map_err(|err| CollectorError::InvalidParam(err.to_string()))?;
        let line = truncate_middle(line, &self.settings.audit_limits);
        if let Err(err) = self.audit.append(&line) {
            warn!(error = %err, "failed to append audit record");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
