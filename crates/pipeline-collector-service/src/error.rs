// crates/pipeline-collector-service/src/error.rs
// ============================================================================
// Module: Service Errors
// Description: Failures raised while assembling the collector service.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors raised while building a [`crate::CollectorService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration failed to load or validate.
    #[error("config error: {0}")]
    Config(String),
    /// Object store could not be initialized.
    #[error("object store error: {0}")]
    ObjectStore(String),
    /// Audit trail could not be opened.
    #[error("audit trail error: {0}")]
    Audit(String),
}
