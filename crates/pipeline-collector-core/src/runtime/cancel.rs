// crates/pipeline-collector-core/src/runtime/cancel.rs
// ============================================================================
// Module: Cancellation Helpers
// Description: Races backend futures against a cancellation token.
// Purpose: Turn caller cancellation into a typed error at every await point.
// Dependencies: tokio, tokio-util
// ============================================================================

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::runtime::error::CollectorError;

/// Awaits `future` unless `cancel` fires first.
pub(crate) async fn with_cancel<F>(
    cancel: &CancellationToken,
    operation: &str,
    future: F,
) -> Result<F::Output, CollectorError>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CollectorError::Cancelled(operation.to_string())),
        output = future => Ok(output),
    }
}
