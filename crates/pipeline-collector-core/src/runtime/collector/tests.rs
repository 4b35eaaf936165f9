// crates/pipeline-collector-core/src/runtime/collector/tests.rs
// ============================================================================
// Module: Collector Unit Tests
// Description: Audit handling inside the collection workflow.
// Purpose: Ensure audit lines are bounded and audit failures stay non-fatal.
// Dependencies: tokio, serde_json
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use time::macros::datetime;

use super::*;
use crate::core::identifiers::CorrelationId;
use crate::interfaces::LogLine;
use crate::runtime::memory::InMemoryAuditSink;
use crate::runtime::memory::InMemoryObjectStore;
use crate::runtime::memory::InMemoryOrchestrator;
use crate::runtime::memory::ScriptedLog;
use crate::runtime::truncate::TRUNCATION_MARKER;

fn fixed_clock() -> OffsetDateTime {
    datetime!(2024-01-15 10:00 UTC)
}

fn fixture(
    log: ScriptedLog,
    settings: CollectionSettings,
) -> (Collector, Arc<InMemoryAuditSink>, Arc<InMemoryOrchestrator>, PipelineRun) {
    let store = Arc::new(InMemoryObjectStore::new("bucket"));
    let orchestrator = Arc::new(InMemoryOrchestrator::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let run = PipelineRun::new("build-1");
    orchestrator.insert_run(run.clone(), CorrelationId::new("ci-1"), log);
    let collector = Collector::new(
        ObjectPersister::new(store),
        orchestrator.clone(),
        audit.clone(),
        settings,
    )
    .with_clock(fixed_clock);
    (collector, audit, orchestrator, run)
}

#[tokio::test]
async fn audit_line_is_truncated_to_head_marker_tail() {
    let long_text = "x".repeat(4096);
    let log = ScriptedLog::new(vec![LogLine::entry("t", "s", long_text)], Vec::new());
    let settings = CollectionSettings {
        audit_limits: AuditLimits {
            limit: 1024,
            head: 100,
            tail: 200,
        },
        ..CollectionSettings::default()
    };
    let (collector, audit, _, run) = fixture(log, settings);
    collector
        .collect(&run, &PlatformContext::default(), &CancellationToken::new())
        .await
        .unwrap();
    let lines = audit.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].len(), 100 + TRUNCATION_MARKER.len() + 200);
    assert!(lines[0].starts_with(b"{\"object\":{\"url\":\"memory://bucket/202401/pr/"));
}

#[tokio::test]
async fn audit_line_is_complete_json_when_small() {
    let log = ScriptedLog::new(vec![LogLine::entry("t", "s", "done")], Vec::new());
    let (collector, audit, _, run) = fixture(log, CollectionSettings::default());
    let result = collector
        .collect(&run, &PlatformContext::default(), &CancellationToken::new())
        .await
        .unwrap();
    let lines = audit.lines();
    let value: serde_json::Value = serde_json::from_slice(&lines[0]).unwrap();
    assert_eq!(value["log"]["content"], "[t:s] done\n");
    assert_eq!(value["log"]["url"], result.log_url.as_str());
    assert_eq!(value["object"]["url"], result.snapshot_url.as_str());
    assert_eq!(value["object"]["metadata"]["pipelineRun"]["name"], "build-1");
}

#[tokio::test]
async fn audit_failure_does_not_fail_collection() {
    let (collector, audit, orchestrator, run) =
        fixture(ScriptedLog::default(), CollectionSettings::default());
    audit.fail_appends("disk full");
    collector
        .collect(&run, &PlatformContext::default(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(!orchestrator.contains_run("build-1"));
}
