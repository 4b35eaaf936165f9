// crates/pipeline-collector-service/src/service.rs
// ============================================================================
// Module: Collector Service
// Description: Composition root building the collector and retriever.
// Purpose: Construct every shared capability once and hand out the workflows.
// Dependencies: pipeline-collector-{config,core,s3}, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`CollectorService`] owns the object store, the audit trail, and the
//! orchestrator adapter for the life of the process. Collections and reads
//! share the same instances, so concurrent collections append to one audit
//! file through one lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use pipeline_collector_config::CollectorConfig;
use pipeline_collector_core::AuditSink;
use pipeline_collector_core::CollectResult;
use pipeline_collector_core::Collector;
use pipeline_collector_core::CollectorError;
use pipeline_collector_core::ObjectPersister;
use pipeline_collector_core::ObjectStore;
use pipeline_collector_core::Orchestrator;
use pipeline_collector_core::PersistedRun;
use pipeline_collector_core::PipelineRun;
use pipeline_collector_core::PlatformContext;
use pipeline_collector_core::RunLog;
use pipeline_collector_core::RunRetriever;
use pipeline_collector_s3::S3ObjectStore;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::audit::RotatingFileAuditSink;
use crate::error::ServiceError;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Process-wide collector and retriever over shared backends.
pub struct CollectorService {
    /// Collect-then-delete workflow.
    collector: Collector,
    /// Persisted-first read path.
    retriever: RunRetriever,
}

impl CollectorService {
    /// Builds the service with the S3 store and rotating audit trail described
    /// by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the config is invalid, the store cannot
    /// be built, or the audit file cannot be opened.
    pub async fn from_config(
        config: &CollectorConfig,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Result<Self, ServiceError> {
        config.validate().map_err(|err| ServiceError::Config(err.to_string()))?;
        let store = S3ObjectStore::connect(&config.object_store)
            .await
            .map_err(|err| ServiceError::ObjectStore(err.to_string()))?;
        let audit = RotatingFileAuditSink::from_config(&config.audit)
            .map_err(|err| ServiceError::Audit(err.to_string()))?;
        info!(
            bucket = %config.object_store.bucket,
            audit_path = %audit.path().display(),
            "collector service ready"
        );
        Ok(Self::assemble(config, Arc::new(store), orchestrator, Arc::new(audit)))
    }

    /// Builds the service over caller-supplied backends.
    #[must_use]
    pub fn assemble(
        config: &CollectorConfig,
        store: Arc<dyn ObjectStore>,
        orchestrator: Arc<dyn Orchestrator>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let persister = ObjectPersister::new(store);
        let collector = Collector::new(
            persister.clone(),
            Arc::clone(&orchestrator),
            audit,
            config.collection.settings(),
        );
        let retriever = RunRetriever::new(persister, orchestrator);
        Self {
            collector,
            retriever,
        }
    }

    /// Returns the collector.
    #[must_use]
    pub const fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Returns the retriever.
    #[must_use]
    pub const fn retriever(&self) -> &RunRetriever {
        &self.retriever
    }

    /// Collects a finished run; see [`Collector::collect`].
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] when collection fails.
    pub async fn collect(
        &self,
        run: &PipelineRun,
        context: &PlatformContext,
        cancel: &CancellationToken,
    ) -> Result<CollectResult, CollectorError> {
        self.collector.collect(run, context, cancel).await
    }

    /// Reads a run log; see [`RunRetriever::get_log`].
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] when neither source can serve the log.
    pub async fn get_log(
        &self,
        run: &PersistedRun,
        cancel: &CancellationToken,
    ) -> Result<RunLog, CollectorError> {
        self.retriever.get_log(run, cancel).await
    }

    /// Reads a run definition; see [`RunRetriever::get_run`].
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] when the lookup fails.
    pub async fn get_run(
        &self,
        run: &PersistedRun,
        cancel: &CancellationToken,
    ) -> Result<Option<PipelineRun>, CollectorError> {
        self.retriever.get_run(run, cancel).await
    }
}
