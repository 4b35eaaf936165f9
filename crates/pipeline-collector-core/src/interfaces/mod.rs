// crates/pipeline-collector-core/src/interfaces/mod.rs
// ============================================================================
// Module: Pipeline Collector Interfaces
// Description: Capability contracts for object storage, orchestrator, and audit.
// Purpose: Define the narrow surfaces the collector consumes from its backends.
// Dependencies: crate::core, async-trait, bytes, tokio
// ============================================================================

//! ## Overview
//! The collector never talks to a backend directly. Object storage, the
//! pipeline orchestrator, and the local audit trail are reached through the
//! traits below, each with a single production adapter and an in-memory
//! double in [`crate::runtime::memory`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::identifiers::CorrelationId;
use crate::core::run::PipelineRun;

// ============================================================================
// SECTION: Log Streams
// ============================================================================

/// Raw line text orchestrators use to request a blank separator.
pub const FLUSH_MARKER: &str = "EOFLOG";

/// One event on the orchestrator's line channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// A line of step output.
    Entry {
        /// Task name.
        task: String,
        /// Step name.
        step: String,
        /// Line text without a trailing newline.
        text: String,
    },
    /// Flush marker: emit a blank separator, not content.
    Flush,
}

impl LogLine {
    /// Builds a line event, mapping the raw [`FLUSH_MARKER`] to [`LogLine::Flush`].
    #[must_use]
    pub fn from_raw(task: impl Into<String>, step: impl Into<String>, text: &str) -> Self {
        if text == FLUSH_MARKER {
            return Self::Flush;
        }
        Self::Entry {
            task: task.into(),
            step: step.into(),
            text: text.to_string(),
        }
    }

    /// Builds a content line.
    #[must_use]
    pub fn entry(
        task: impl Into<String>,
        step: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::Entry {
            task: task.into(),
            step: step.into(),
            text: text.into(),
        }
    }
}

/// Live log output of a run: independent line and error channels.
///
/// Each channel closes on its own; consumers must keep reading the other one.
#[derive(Debug)]
pub struct LogStreams {
    /// Step output lines.
    pub lines: mpsc::Receiver<LogLine>,
    /// Free-text errors raised while streaming.
    pub errors: mpsc::Receiver<String>,
}

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Tags attached to a stored object.
pub type ObjectTags = BTreeMap<String, String>;

/// Object-store errors.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// The requested key does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Invalid configuration or key input.
    #[error("object store invalid: {0}")]
    Invalid(String),
    /// Backend I/O failure.
    #[error("object store io error: {0}")]
    Io(String),
    /// Backend returned an error.
    #[error("object store backend error: {0}")]
    Backend(String),
}

/// Durable object storage with signed URL issuance.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the bucket objects are written to.
    fn bucket(&self) -> &str;

    /// Writes bytes under a key, attaching tags.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the backend rejects the write.
    async fn put(&self, key: &str, bytes: Bytes, tags: &ObjectTags)
    -> Result<(), ObjectStoreError>;

    /// Reads the bytes stored under a key.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] for a missing key and other
    /// variants for backend failures.
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Issues a time-limited retrieval URL. The object need not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the URL cannot be signed.
    async fn signed_url(&self, key: &str, expires_in: Duration)
    -> Result<String, ObjectStoreError>;
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Orchestrator errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The run does not exist (never created or already reconciled).
    #[error("pipeline run not found: {0}")]
    NotFound(String),
    /// Any other orchestrator failure.
    #[error("orchestrator error: {0}")]
    Backend(String),
}

/// Pipeline orchestrator executing runs.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Opens the live log streams of a run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the run is unknown or streaming fails.
    async fn log_stream(&self, run: &PipelineRun) -> Result<LogStreams, OrchestratorError>;

    /// Opens the live log streams of a run by correlation identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when streaming fails.
    async fn log_stream_by_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<LogStreams, OrchestratorError>;

    /// Re-reads a run definition.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the lookup fails.
    async fn get_run(&self, run: &PipelineRun) -> Result<PipelineRun, OrchestratorError>;

    /// Looks a run up by correlation identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] when no such run exists.
    async fn get_run_by_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<PipelineRun, OrchestratorError>;

    /// Deletes the live run resource.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] when the run is already gone.
    async fn delete_run(&self, run: &PipelineRun) -> Result<(), OrchestratorError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Audit trail errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Writing the audit line failed.
    #[error("audit io error: {0}")]
    Io(String),
}

/// Append-only local audit trail, shared by all concurrent collections.
pub trait AuditSink: Send + Sync {
    /// Appends one record as a single line. Appends are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the line cannot be written.
    fn append(&self, line: &[u8]) -> Result<(), AuditError>;
}
