// crates/pipeline-collector-core/src/runtime/retrieval.rs
// ============================================================================
// Module: Retrieval Fallback
// Description: Read path for run logs and definitions.
// Purpose: Prefer the persisted copy; fall back to the live orchestrator.
// Dependencies: crate::{core, interfaces, runtime}, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`RunRetriever`] composes the object store and the orchestrator. When a
//! platform record carries a persisted key the orchestrator is never
//! contacted. Otherwise the run is looked up live by correlation identifier.
//!
//! A missing persisted object is an error (expected data is gone), whereas a
//! missing live run from [`RunRetriever::get_run`] is reported as `None`: it
//! means the run never existed or was already reconciled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing::debug;
use tracing::info_span;

use crate::core::records::PersistedRun;
use crate::core::records::RunSnapshotEnvelope;
use crate::core::run::PipelineRun;
use crate::core::storage_key::StorageKey;
use crate::interfaces::LogStreams;
use crate::interfaces::Orchestrator;
use crate::interfaces::OrchestratorError;
use crate::runtime::cancel::with_cancel;
use crate::runtime::error::CollectorError;
use crate::runtime::error::ResourceKind;
use crate::runtime::persister::ObjectPersister;
use crate::runtime::timing::OperationTimer;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A run log: either the persisted text or the live, un-merged streams.
#[derive(Debug)]
pub enum RunLog {
    /// Persisted merged log bytes.
    Persisted(Bytes),
    /// Live line and error channels; the caller formats and consumes them.
    Live(LogStreams),
}

// ============================================================================
// SECTION: Retriever
// ============================================================================

/// Persisted-first reader for run logs and definitions.
#[derive(Clone)]
pub struct RunRetriever {
    /// Object-store facade.
    persister: ObjectPersister,
    /// Orchestrator fallback.
    orchestrator: Arc<dyn Orchestrator>,
}

impl RunRetriever {
    /// Creates a retriever over a persister and an orchestrator.
    #[must_use]
    pub fn new(persister: ObjectPersister, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            persister,
            orchestrator,
        }
    }

    /// Returns the log of a run.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::NotFound`] for a missing persisted log,
    /// [`CollectorError::StoreGetFailed`] for store failures, and
    /// [`CollectorError::OrchestratorGetFailed`] when live streaming fails.
    pub async fn get_log(
        &self,
        run: &PersistedRun,
        cancel: &CancellationToken,
    ) -> Result<RunLog, CollectorError> {
        let span = info_span!("get_log", run = %run.name);
        async {
            let _timer = OperationTimer::start("get_log");
            if let Some(key) = persisted_key(run.log_object.as_ref()) {
                debug!(log_object = %key, "reading persisted log");
                let bytes = self.persister.get(key, ResourceKind::Log, cancel).await?;
                return Ok(RunLog::Persisted(Bytes::from(bytes)));
            }
            debug!(correlation_id = %run.correlation_id, "streaming live log");
            let streams = with_cancel(
                cancel,
                "open log stream",
                self.orchestrator.log_stream_by_id(&run.correlation_id),
            )
            .await?
            .map_err(|err| CollectorError::OrchestratorGetFailed(err.to_string()))?;
            Ok(RunLog::Live(streams))
        }
        .instrument(span)
        .await
    }

    /// Returns the definition of a run, or `None` when the live run is gone.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] for a missing or malformed persisted
    /// snapshot and for orchestrator failures other than not-found.
    pub async fn get_run(
        &self,
        run: &PersistedRun,
        cancel: &CancellationToken,
    ) -> Result<Option<PipelineRun>, CollectorError> {
        let span = info_span!("get_run", run = %run.name);
        async {
            let _timer = OperationTimer::start("get_run");
            if let Some(key) = persisted_key(run.snapshot_object.as_ref()) {
                let envelope = self.get_run_object(key, cancel).await?;
                return Ok(Some(envelope.pipeline_run));
            }
            let lookup = with_cancel(
                cancel,
                "get run",
                self.orchestrator.get_run_by_id(&run.correlation_id),
            )
            .await?;
            match lookup {
                Ok(found) => Ok(Some(found)),
                Err(OrchestratorError::NotFound(_)) => {
                    debug!(correlation_id = %run.correlation_id, "live run not found");
                    Ok(None)
                }
                Err(err) => Err(CollectorError::OrchestratorGetFailed(err.to_string())),
            }
        }
        .instrument(span)
        .await
    }

    /// Reads and decodes a persisted snapshot envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::NotFound`] for a missing snapshot and
    /// [`CollectorError::InvalidParam`] for malformed JSON.
    pub async fn get_run_object(
        &self,
        key: &StorageKey,
        cancel: &CancellationToken,
    ) -> Result<RunSnapshotEnvelope, CollectorError> {
        async {
            let _timer = OperationTimer::start("get_run_object");
            let bytes = self.persister.get(key, ResourceKind::Snapshot, cancel).await?;
            serde_json::from_slice(&bytes)
                .map_err(|err| CollectorError::InvalidParam(err.to_string()))
        }
        .instrument(info_span!("get_run_object", key = %key))
        .await
    }
}

/// Treats an empty key the same as no key.
fn persisted_key(key: Option<&StorageKey>) -> Option<&StorageKey> {
    key.filter(|key| !key.as_str().is_empty())
}
