// crates/pipeline-collector-core/src/runtime/merge.rs
// ============================================================================
// Module: Log Stream Merger
// Description: Merges a run's line and error channels into one ordered text.
// Purpose: Capture the complete log, in arrival order, before persistence.
// Dependencies: crate::interfaces, bytes, tokio, tokio-util
// ============================================================================

//! ## Overview
//! A dedicated worker task reads both upstream channels until both have
//! closed. Each event is rendered and handed to the drain stage through a
//! single-slot channel, so the worker waits for the reader after every chunk.
//! The drain stage materializes the whole log in memory.
//!
//! Line events render as `[task:step] text\n`, flush events as `\n`, and
//! error events as `text\n`. Both stages watch the cancellation token; a
//! cancelled merge ends with [`CollectorError::Cancelled`] instead of
//! waiting for upstream channels that may never close.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::interfaces::LogLine;
use crate::interfaces::LogStreams;
use crate::runtime::error::CollectorError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Capacity of the hand-off between worker and drain stage.
const HANDOFF_CAPACITY: usize = 1;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How the merge worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeOutcome {
    /// Both upstream channels closed.
    Completed,
    /// The cancellation token fired.
    Cancelled,
    /// The drain stage went away before the worker finished.
    ReaderClosed,
}

/// Event received from either upstream channel; `None` means closed.
enum MergeEvent {
    /// Line channel event.
    Line(Option<LogLine>),
    /// Error channel event.
    Error(Option<String>),
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Merges both channels of `streams` into one byte buffer.
///
/// # Errors
///
/// Returns [`CollectorError::Cancelled`] when `cancel` fires before both
/// channels close and [`CollectorError::ReadFailed`] when the worker dies.
pub async fn merge_log_streams(
    streams: LogStreams,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, CollectorError> {
    let (chunks, worker) = spawn_merge_worker(streams, cancel.clone());
    let drained = drain(chunks, cancel).await;
    let outcome = worker.await.map_err(|err| CollectorError::ReadFailed(err.to_string()))?;
    let bytes = drained?;
    match outcome {
        MergeOutcome::Completed => Ok(bytes),
        MergeOutcome::Cancelled => Err(CollectorError::Cancelled("log merge".to_string())),
        MergeOutcome::ReaderClosed => {
            Err(CollectorError::ReadFailed("log reader closed before merge finished".to_string()))
        }
    }
}

/// Renders a single line event.
#[must_use]
pub fn render_line(line: &LogLine) -> String {
    match line {
        LogLine::Entry {
            task,
            step,
            text,
        } => format!("[{task}:{step}] {text}\n"),
        LogLine::Flush => "\n".to_string(),
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Spawns the merge worker and returns the read side of the hand-off.
fn spawn_merge_worker(
    streams: LogStreams,
    cancel: CancellationToken,
) -> (mpsc::Receiver<Bytes>, JoinHandle<MergeOutcome>) {
    let (sender, receiver) = mpsc::channel(HANDOFF_CAPACITY);
    let worker = tokio::spawn(merge_loop(streams, sender, cancel));
    (receiver, worker)
}

/// Worker body. Dropping `sender` on return signals end-of-stream.
async fn merge_loop(
    streams: LogStreams,
    sender: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
) -> MergeOutcome {
    let LogStreams {
        lines,
        errors,
    } = streams;
    let mut lines = Some(lines);
    let mut errors = Some(errors);
    while lines.is_some() || errors.is_some() {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return MergeOutcome::Cancelled,
            line = recv_open(&mut lines) => MergeEvent::Line(line),
            error = recv_open(&mut errors) => MergeEvent::Error(error),
        };
        let chunk = match event {
            MergeEvent::Line(Some(line)) => render_line(&line),
            MergeEvent::Error(Some(error)) => format!("{error}\n"),
            MergeEvent::Line(None) => {
                lines = None;
                continue;
            }
            MergeEvent::Error(None) => {
                errors = None;
                continue;
            }
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => return MergeOutcome::Cancelled,
            sent = sender.send(Bytes::from(chunk)) => {
                if sent.is_err() {
                    return MergeOutcome::ReaderClosed;
                }
            }
        }
    }
    MergeOutcome::Completed
}

/// Receives from an open channel; a closed (`None`) channel never resolves.
async fn recv_open<T>(receiver: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// SECTION: Drain
// ============================================================================

/// Reads the hand-off to completion.
async fn drain(
    mut chunks: mpsc::Receiver<Bytes>,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, CollectorError> {
    let mut buffer = Vec::new();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(CollectorError::Cancelled("log drain".to_string()));
            }
            chunk = chunks.recv() => match chunk {
                Some(chunk) => buffer.extend_from_slice(&chunk),
                None => return Ok(buffer),
            },
        }
    }
}

#[cfg(test)]
mod tests;
