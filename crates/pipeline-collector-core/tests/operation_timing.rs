//! Span and timing tests for pipeline-collector-core.
// crates/pipeline-collector-core/tests/operation_timing.rs
// =============================================================================
// Module: Operation Timing Tests
// Description: Per-operation spans and elapsed-time events.
// Purpose: Validate that every operation exit, including failures, is timed.
// =============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use pipeline_collector_core::CorrelationId;
use pipeline_collector_core::PersistedRun;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing::subscriber::DefaultGuard;

mod common;

use common::Harness;
use common::finished_run;
use common::shop_context;

// ============================================================================
// SECTION: Capture
// ============================================================================

/// Shared buffer the fmt subscriber writes into.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Lines of elapsed-time events.
    fn timing_lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter(|line| line.contains("operation finished") && line.contains("elapsed_ms="))
            .map(str::to_string)
            .collect()
    }

    fn timed(&self, operation: &str) -> bool {
        let quoted = format!("operation=\"{operation}\"");
        let bare = format!("operation={operation} ");
        self.timing_lines().iter().any(|line| line.contains(&quoted) || line.contains(&bare))
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn collect_times_each_stage_inside_its_span() {
    let captured = Captured::default();
    let _guard = captured.install();
    let harness = Harness::new();
    harness
        .collector
        .collect(&finished_run(), &shop_context(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(captured.timed("collect"));
    assert!(captured.timed("collect_log"));
    assert!(captured.timed("collect_snapshot"));
    let lines = captured.timing_lines();
    assert!(lines.iter().any(|line| line.contains("collect_log{run=build-42}")), "{lines:?}");
    assert!(lines.iter().any(|line| line.contains("collect_snapshot{run=build-42}")), "{lines:?}");
}

#[tokio::test]
async fn failed_collection_is_still_timed() {
    let captured = Captured::default();
    let _guard = captured.install();
    let harness = Harness::new();
    harness.store.fail_puts("quota exceeded");
    let result = harness
        .collector
        .collect(&finished_run(), &shop_context(), &CancellationToken::new())
        .await;

    assert!(result.is_err());
    assert!(captured.timed("collect_log"));
    assert!(captured.timed("collect"));
    assert!(!captured.timed("collect_snapshot"));
}

#[tokio::test]
async fn reads_are_timed() {
    let captured = Captured::default();
    let _guard = captured.install();
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    let collected =
        harness.collector.collect(&finished_run(), &shop_context(), &cancel).await.unwrap();
    let persisted = PersistedRun {
        log_object: Some(collected.log_object.clone()),
        snapshot_object: Some(collected.snapshot_object.clone()),
        ..PersistedRun::live("build-42", CorrelationId::new("ci-42"))
    };

    harness.retriever.get_log(&persisted, &cancel).await.unwrap();
    harness.retriever.get_run(&persisted, &cancel).await.unwrap();

    assert!(captured.timed("get_log"));
    assert!(captured.timed("get_run"));
    assert!(captured.timed("get_run_object"));
}

#[tokio::test]
async fn failed_read_is_timed() {
    let captured = Captured::default();
    let _guard = captured.install();
    let harness = Harness::new();
    harness.orchestrator.fail_gets("connection reset");
    let record = PersistedRun::live("build-42", CorrelationId::new("ci-42"));

    assert!(harness.retriever.get_run(&record, &CancellationToken::new()).await.is_err());
    assert!(captured.timed("get_run"));
}
