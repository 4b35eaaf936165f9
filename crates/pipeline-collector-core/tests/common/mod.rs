// crates/pipeline-collector-core/tests/common/mod.rs
// =============================================================================
// Module: Collector Test Helpers
// Description: Shared fixtures for collector integration tests.
// Purpose: Build runs, platform contexts, and wired in-memory collectors.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;

use pipeline_collector_core::CollectionSettings;
use pipeline_collector_core::Collector;
use pipeline_collector_core::CorrelationId;
use pipeline_collector_core::LogLine;
use pipeline_collector_core::ObjectPersister;
use pipeline_collector_core::PipelineRun;
use pipeline_collector_core::PlatformContext;
use pipeline_collector_core::RunRetriever;
use pipeline_collector_core::RunStatus;
use pipeline_collector_core::runtime::InMemoryAuditSink;
use pipeline_collector_core::runtime::InMemoryObjectStore;
use pipeline_collector_core::runtime::InMemoryOrchestrator;
use pipeline_collector_core::runtime::ScriptedLog;
use time::OffsetDateTime;
use time::macros::datetime;

/// Bucket used by every fixture.
pub const BUCKET: &str = "pipeline-runs";

/// Clock pinned to January 2024.
pub fn january_2024() -> OffsetDateTime {
    datetime!(2024-01-20 08:30 UTC)
}

/// Finished run `build-42` of pipeline `deploy`.
pub fn finished_run() -> PipelineRun {
    let mut run = PipelineRun::new("build-42");
    run.namespace = "ci".to_string();
    run.pipeline = "deploy".to_string();
    run.creation_timestamp = Some(datetime!(2024-01-20 08:00 UTC));
    run.status = RunStatus {
        result: "ok".to_string(),
        start_time: Some(datetime!(2024-01-20 08:01 UTC)),
        completion_time: Some(datetime!(2024-01-20 08:03:30 UTC)),
    };
    run.manifest = serde_json::json!({"kind": "PipelineRun", "metadata": {"name": "build-42"}});
    run
}

/// Platform context for application `shop`/7 on cluster `prod`/3.
pub fn shop_context() -> PlatformContext {
    PlatformContext {
        application: Some("shop".to_string()),
        application_id: Some(7),
        cluster: Some("prod".to_string()),
        cluster_id: Some(3),
        environment: Some("production".to_string()),
        operator: Some("alice@example.com".to_string()),
        pipeline_run_id: Some(1001),
    }
}

/// Log script used by [`Harness::new`].
pub fn sample_log() -> ScriptedLog {
    ScriptedLog::new(
        vec![LogLine::entry("t1", "s1", "hello"), LogLine::Flush, LogLine::entry("t1", "s2", "world")],
        Vec::new(),
    )
}

/// In-memory backends wired into a collector and a retriever.
pub struct Harness {
    /// Object store.
    pub store: Arc<InMemoryObjectStore>,
    /// Orchestrator.
    pub orchestrator: Arc<InMemoryOrchestrator>,
    /// Audit sink.
    pub audit: Arc<InMemoryAuditSink>,
    /// Collector under test.
    pub collector: Collector,
    /// Retriever under test.
    pub retriever: RunRetriever,
}

impl Harness {
    /// Builds a harness with `finished_run` registered under correlation id `ci-42`.
    pub fn new() -> Self {
        Self::with_log(sample_log())
    }

    /// Builds a harness whose run serves `log`.
    pub fn with_log(log: ScriptedLog) -> Self {
        let store = Arc::new(InMemoryObjectStore::new(BUCKET));
        let orchestrator = Arc::new(InMemoryOrchestrator::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        orchestrator.insert_run(finished_run(), CorrelationId::new("ci-42"), log);
        let persister = ObjectPersister::new(store.clone());
        let collector = Collector::new(
            persister.clone(),
            orchestrator.clone(),
            audit.clone(),
            CollectionSettings::default(),
        )
        .with_clock(january_2024);
        let retriever = RunRetriever::new(persister, orchestrator.clone());
        Self {
            store,
            orchestrator,
            audit,
            collector,
            retriever,
        }
    }
}
