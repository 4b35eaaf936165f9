// crates/pipeline-collector-core/src/runtime/timing.rs
// ============================================================================
// Module: Operation Timing
// Description: Elapsed-time logging for collector and retriever operations.
// Purpose: Emit one debug event per operation exit, success or failure.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! [`OperationTimer`] logs on drop, so early returns through `?` are timed
//! the same as the success path. Create it inside the operation's span so the
//! event carries the span's fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use tracing::debug;

// ============================================================================
// SECTION: Timer
// ============================================================================

/// Drop guard that logs the elapsed time of an operation.
pub(crate) struct OperationTimer {
    /// Operation name recorded on the event.
    operation: &'static str,
    /// Start of the operation.
    started: Instant,
}

impl OperationTimer {
    /// Starts timing `operation`.
    pub(crate) fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        debug!(
            operation = self.operation,
            elapsed_ms = self.started.elapsed().as_millis(),
            "operation finished"
        );
    }
}
