// crates/pipeline-collector-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Backends
// Description: In-memory object store, orchestrator, and audit sink.
// Purpose: Compose the collector without network backends; record calls.
// Dependencies: crate::{core, interfaces}, async-trait, tokio
// ============================================================================

//! ## Overview
//! These backends are deterministic and keep a call journal so that ordering
//! (objects stored before deletion) and fallback behavior (no orchestrator
//! contact when a persisted copy exists) can be asserted. Failures can be
//! injected per operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::core::identifiers::CorrelationId;
use crate::core::run::PipelineRun;
use crate::interfaces::AuditError;
use crate::interfaces::AuditSink;
use crate::interfaces::LogLine;
use crate::interfaces::LogStreams;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::ObjectTags;
use crate::interfaces::Orchestrator;
use crate::interfaces::OrchestratorError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Locks a mutex, recovering the data from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Stored object body and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes.
    pub bytes: Bytes,
    /// Attached tags.
    pub tags: ObjectTags,
}

/// Operations that can be made to fail.
#[derive(Debug, Default)]
struct StoreFailures {
    /// Error message returned by `put`.
    put: Option<String>,
    /// Error message returned by `get`.
    get: Option<String>,
    /// Error message returned by `signed_url`.
    sign: Option<String>,
}

/// In-memory object store.
pub struct InMemoryObjectStore {
    /// Bucket name.
    bucket: String,
    /// Objects keyed by storage key.
    objects: Mutex<BTreeMap<String, StoredObject>>,
    /// Injected failures.
    failures: Mutex<StoreFailures>,
    /// Call journal (`put:<key>`, `get:<key>`, `sign:<key>`).
    calls: Mutex<Vec<String>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(StoreFailures::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes every subsequent `put` fail with `message`.
    pub fn fail_puts(&self, message: impl Into<String>) {
        lock(&self.failures).put = Some(message.into());
    }

    /// Makes every subsequent `get` fail with a backend error.
    pub fn fail_gets(&self, message: impl Into<String>) {
        lock(&self.failures).get = Some(message.into());
    }

    /// Makes every subsequent `signed_url` fail with `message`.
    pub fn fail_signing(&self, message: impl Into<String>) {
        lock(&self.failures).sign = Some(message.into());
    }

    /// Inserts an object directly.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Bytes>) {
        lock(&self.objects).insert(
            key.into(),
            StoredObject {
                bytes: bytes.into(),
                tags: ObjectTags::new(),
            },
        );
    }

    /// Returns the object stored under `key`.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Returns true when no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.objects).is_empty()
    }

    /// Returns the call journal.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Appends an entry to the call journal.
    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        tags: &ObjectTags,
    ) -> Result<(), ObjectStoreError> {
        self.record(format!("put:{key}"));
        if let Some(message) = lock(&self.failures).put.clone() {
            return Err(ObjectStoreError::Backend(message));
        }
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                bytes,
                tags: tags.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.record(format!("get:{key}"));
        if let Some(message) = lock(&self.failures).get.clone() {
            return Err(ObjectStoreError::Backend(message));
        }
        lock(&self.objects)
            .get(key)
            .map(|object| object.bytes.to_vec())
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn signed_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        self.record(format!("sign:{key}"));
        if let Some(message) = lock(&self.failures).sign.clone() {
            return Err(ObjectStoreError::Backend(message));
        }
        Ok(format!("memory://{}/{key}?expires={}", self.bucket, expires_in.as_secs()))
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Scripted log output served for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedLog {
    /// Events delivered on the line channel.
    pub lines: Vec<LogLine>,
    /// Events delivered on the error channel.
    pub errors: Vec<String>,
    /// Keep both channels open after delivering the events.
    pub hold_open: bool,
}

impl ScriptedLog {
    /// Creates a script that closes both channels after delivery.
    #[must_use]
    pub const fn new(lines: Vec<LogLine>, errors: Vec<String>) -> Self {
        Self {
            lines,
            errors,
            hold_open: false,
        }
    }

    /// Creates closed-after-delivery channels carrying the script.
    fn open(&self, held: &Mutex<Vec<HeldSenders>>) -> LogStreams {
        let (line_tx, line_rx) = mpsc::channel(self.lines.len().max(1));
        let (error_tx, error_rx) = mpsc::channel(self.errors.len().max(1));
        for line in &self.lines {
            let _ = line_tx.try_send(line.clone());
        }
        for error in &self.errors {
            let _ = error_tx.try_send(error.clone());
        }
        if self.hold_open {
            lock(held).push((line_tx, error_tx));
        }
        LogStreams {
            lines: line_rx,
            errors: error_rx,
        }
    }
}

/// Senders kept alive so that scripted channels never close.
type HeldSenders = (mpsc::Sender<LogLine>, mpsc::Sender<String>);

/// In-memory orchestrator.
///
/// Logs outlive the run: deleting a run does not remove its scripted log.
#[derive(Default)]
pub struct InMemoryOrchestrator {
    /// Live runs keyed by name.
    runs: Mutex<BTreeMap<String, PipelineRun>>,
    /// Correlation identifier to run name.
    correlations: Mutex<BTreeMap<CorrelationId, String>>,
    /// Scripted logs keyed by run name.
    logs: Mutex<BTreeMap<String, ScriptedLog>>,
    /// Senders of held-open scripts.
    held: Mutex<Vec<HeldSenders>>,
    /// Error message returned by `delete_run`.
    delete_failure: Mutex<Option<String>>,
    /// Error message returned by lookups and streams.
    get_failure: Mutex<Option<String>>,
    /// Call journal (`log:<run>`, `log_by_id:<id>`, `get:<run>`, `get_by_id:<id>`, `delete:<run>`).
    calls: Mutex<Vec<String>>,
}

impl InMemoryOrchestrator {
    /// Creates an empty orchestrator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live run with its correlation identifier and log script.
    pub fn insert_run(&self, run: PipelineRun, correlation_id: CorrelationId, log: ScriptedLog) {
        lock(&self.correlations).insert(correlation_id, run.name.clone());
        lock(&self.logs).insert(run.name.clone(), log);
        lock(&self.runs).insert(run.name.clone(), run);
    }

    /// Makes every subsequent `delete_run` fail with a backend error.
    pub fn fail_deletes(&self, message: impl Into<String>) {
        *lock(&self.delete_failure) = Some(message.into());
    }

    /// Makes every subsequent lookup and stream fail with a backend error.
    pub fn fail_gets(&self, message: impl Into<String>) {
        *lock(&self.get_failure) = Some(message.into());
    }

    /// Returns true when the run is still live.
    #[must_use]
    pub fn contains_run(&self, name: &str) -> bool {
        lock(&self.runs).contains_key(name)
    }

    /// Returns the call journal.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Appends an entry to the call journal.
    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }

    /// Returns the injected lookup failure, if any.
    fn get_failure(&self) -> Result<(), OrchestratorError> {
        lock(&self.get_failure).clone().map_or(Ok(()), |message| {
            Err(OrchestratorError::Backend(message))
        })
    }

    /// Resolves a correlation identifier to a run name.
    fn name_for(&self, correlation_id: &CorrelationId) -> Result<String, OrchestratorError> {
        lock(&self.correlations)
            .get(correlation_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(correlation_id.to_string()))
    }

    /// Opens the scripted log for a run name.
    fn open_log(&self, name: &str) -> Result<LogStreams, OrchestratorError> {
        let script = lock(&self.logs)
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(name.to_string()))?;
        Ok(script.open(&self.held))
    }
}

#[async_trait]
impl Orchestrator for InMemoryOrchestrator {
    async fn log_stream(&self, run: &PipelineRun) -> Result<LogStreams, OrchestratorError> {
        self.record(format!("log:{}", run.name));
        self.get_failure()?;
        self.open_log(&run.name)
    }

    async fn log_stream_by_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<LogStreams, OrchestratorError> {
        self.record(format!("log_by_id:{correlation_id}"));
        self.get_failure()?;
        let name = self.name_for(correlation_id)?;
        self.open_log(&name)
    }

    async fn get_run(&self, run: &PipelineRun) -> Result<PipelineRun, OrchestratorError> {
        self.record(format!("get:{}", run.name));
        self.get_failure()?;
        lock(&self.runs)
            .get(&run.name)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(run.name.clone()))
    }

    async fn get_run_by_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<PipelineRun, OrchestratorError> {
        self.record(format!("get_by_id:{correlation_id}"));
        self.get_failure()?;
        let name = self.name_for(correlation_id)?;
        lock(&self.runs).get(&name).cloned().ok_or(OrchestratorError::NotFound(name))
    }

    async fn delete_run(&self, run: &PipelineRun) -> Result<(), OrchestratorError> {
        self.record(format!("delete:{}", run.name));
        if let Some(message) = lock(&self.delete_failure).clone() {
            return Err(OrchestratorError::Backend(message));
        }
        lock(&self.runs)
            .remove(&run.name)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::NotFound(run.name.clone()))
    }
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// In-memory audit sink keeping every appended line.
#[derive(Default)]
pub struct InMemoryAuditSink {
    /// Appended lines.
    lines: Mutex<Vec<Vec<u8>>>,
    /// Error message returned by `append`.
    failure: Mutex<Option<String>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent append fail with `message`.
    pub fn fail_appends(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    /// Returns the appended lines.
    #[must_use]
    pub fn lines(&self) -> Vec<Vec<u8>> {
        lock(&self.lines).clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, line: &[u8]) -> Result<(), AuditError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(AuditError::Io(message));
        }
        lock(&self.lines).push(line.to_vec());
        Ok(())
    }
}
