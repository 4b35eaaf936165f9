// crates/pipeline-collector-core/src/runtime/merge/tests.rs
// ============================================================================
// Module: Log Stream Merger Tests
// Description: Unit tests for line rendering, ordering, and cancellation.
// Purpose: Ensure merged logs are complete, ordered, and never stall.
// Dependencies: proptest, tokio
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::time::Duration;

use proptest::prelude::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::*;

/// Builds closed channels pre-filled with the given events.
fn closed_streams(lines: Vec<LogLine>, errors: Vec<&str>) -> LogStreams {
    let (line_tx, line_rx) = mpsc::channel(lines.len().max(1));
    let (error_tx, error_rx) = mpsc::channel(errors.len().max(1));
    for line in lines {
        line_tx.try_send(line).expect("line capacity");
    }
    for error in errors {
        error_tx.try_send(error.to_string()).expect("error capacity");
    }
    LogStreams {
        lines: line_rx,
        errors: error_rx,
    }
}

#[test]
fn render_line_formats_entries_and_flush() {
    assert_eq!(render_line(&LogLine::entry("build", "compile", "ok")), "[build:compile] ok\n");
    assert_eq!(render_line(&LogLine::Flush), "\n");
}

#[test]
fn from_raw_maps_flush_marker() {
    assert_eq!(LogLine::from_raw("t", "s", crate::interfaces::FLUSH_MARKER), LogLine::Flush);
    assert_eq!(LogLine::from_raw("t", "s", "EOFLOG "), LogLine::entry("t", "s", "EOFLOG "));
}

#[tokio::test]
async fn merge_renders_lines_with_flush_separator() {
    let streams = closed_streams(
        vec![LogLine::entry("t1", "s1", "hello"), LogLine::Flush, LogLine::entry("t1", "s2", "world")],
        Vec::new(),
    );
    let merged = merge_log_streams(streams, &CancellationToken::new()).await.unwrap();
    assert_eq!(String::from_utf8(merged).unwrap(), "[t1:s1] hello\n\n[t1:s2] world\n");
}

#[tokio::test]
async fn merge_keeps_reading_errors_after_lines_close() {
    let (line_tx, line_rx) = mpsc::channel(4);
    let (error_tx, error_rx) = mpsc::channel(4);
    line_tx.send(LogLine::entry("t", "s", "first")).await.unwrap();
    drop(line_tx);
    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        error_tx.send("late failure".to_string()).await.unwrap();
    });
    let streams = LogStreams {
        lines: line_rx,
        errors: error_rx,
    };
    let merged = merge_log_streams(streams, &CancellationToken::new()).await.unwrap();
    producer.await.unwrap();
    assert_eq!(String::from_utf8(merged).unwrap(), "[t:s] first\nlate failure\n");
}

#[tokio::test]
async fn merge_follows_delivery_order_across_channels() {
    let (line_tx, line_rx) = mpsc::channel(1);
    let (error_tx, error_rx) = mpsc::channel(1);
    let streams = LogStreams {
        lines: line_rx,
        errors: error_rx,
    };
    let cancel = CancellationToken::new();
    let merge = tokio::spawn(async move { merge_log_streams(streams, &cancel).await });
    line_tx.send(LogLine::entry("a", "b", "one")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    error_tx.send("two".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    line_tx.send(LogLine::entry("a", "b", "three")).await.unwrap();
    drop(line_tx);
    drop(error_tx);
    let merged = merge.await.unwrap().unwrap();
    assert_eq!(String::from_utf8(merged).unwrap(), "[a:b] one\ntwo\n[a:b] three\n");
}

#[tokio::test]
async fn merge_of_empty_closed_streams_is_empty() {
    let merged =
        merge_log_streams(closed_streams(Vec::new(), Vec::new()), &CancellationToken::new())
            .await
            .unwrap();
    assert!(merged.is_empty());
}

#[tokio::test]
async fn cancellation_ends_merge_with_open_sources() {
    let (_line_tx, line_rx) = mpsc::channel::<LogLine>(1);
    let (_error_tx, error_rx) = mpsc::channel::<String>(1);
    let streams = LogStreams {
        lines: line_rx,
        errors: error_rx,
    };
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let result = tokio::time::timeout(Duration::from_secs(5), merge_log_streams(streams, &cancel))
        .await
        .expect("merge must not stall after cancellation");
    assert!(matches!(result, Err(CollectorError::Cancelled(_))));
}

/// Line event generator: text entries and flush markers.
fn line_event() -> impl Strategy<Value = LogLine> {
    prop_oneof![
        3 => "[a-z ]{0,12}".prop_map(|text| LogLine::entry("task", "step", text)),
        1 => Just(LogLine::Flush),
    ]
}

proptest! {
    #[test]
    fn merge_keeps_every_event(
        lines in proptest::collection::vec(line_event(), 0 .. 60),
        errors in proptest::collection::vec("err-[a-z]{1,8}", 0 .. 40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let error_refs: Vec<&str> = errors.iter().map(String::as_str).collect();
        let streams = closed_streams(lines.clone(), error_refs);
        let merged = runtime
            .block_on(merge_log_streams(streams, &CancellationToken::new()))
            .unwrap();
        let merged = String::from_utf8(merged).unwrap();

        let expected_entries: Vec<String> =
            lines.iter().filter(|line| **line != LogLine::Flush).map(render_line).collect();
        let expected_blanks = lines.iter().filter(|line| **line == LogLine::Flush).count();
        let entries: Vec<String> = merged
            .lines()
            .filter(|line| line.starts_with("[task:step] "))
            .map(|line| format!("{line}\n"))
            .collect();
        let seen_errors: Vec<&str> =
            merged.lines().filter(|line| line.starts_with("err-")).collect();
        let blanks = merged.lines().filter(|line| line.is_empty()).count();

        prop_assert_eq!(entries, expected_entries);
        prop_assert_eq!(seen_errors, errors.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert_eq!(blanks, expected_blanks);
        prop_assert!(merged.is_empty() || merged.ends_with('\n'));
    }
}
