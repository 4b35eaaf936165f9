// crates/pipeline-collector-core/src/runtime/error.rs
// ============================================================================
// Module: Collector Errors
// Description: Domain error taxonomy for collection and retrieval.
// Purpose: Wrap backend failures with a domain kind while keeping the cause.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Backend errors are mapped into [`CollectorError`] at the point of use; the
//! backend message is preserved as the variant payload for diagnostics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resource named by a not-found error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Persisted run log.
    Log,
    /// Persisted run snapshot.
    Snapshot,
    /// Live orchestrator run.
    Run,
}

impl ResourceKind {
    /// Returns a stable label for the resource.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "pipeline run log",
            Self::Snapshot => "pipeline run snapshot",
            Self::Run => "pipeline run",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection and retrieval errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Expected resource is missing.
    #[error("{0} not found: {1}")]
    NotFound(ResourceKind, String),
    /// Serialization or deserialization failed.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    /// Object-store write failed.
    #[error("object store put failed: {0}")]
    StorePutFailed(String),
    /// Object-store read failed.
    #[error("object store get failed: {0}")]
    StoreGetFailed(String),
    /// Signed URL issuance failed.
    #[error("object store sign failed: {0}")]
    SignFailed(String),
    /// Draining the merged log stream failed.
    #[error("log read failed: {0}")]
    ReadFailed(String),
    /// Orchestrator lookup or streaming failed.
    #[error("orchestrator get failed: {0}")]
    OrchestratorGetFailed(String),
    /// Orchestrator deletion failed; persisted artifacts remain valid.
    #[error("orchestrator delete failed: {0}")]
    OrchestratorDeleteFailed(String),
    /// The caller cancelled the operation.
    #[error("cancelled during {0}")]
    Cancelled(String),
}

impl CollectorError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(..) => "not_found",
            Self::InvalidParam(_) => "invalid_param",
            Self::StorePutFailed(_) => "store_put_failed",
            Self::StoreGetFailed(_) => "store_get_failed",
            Self::SignFailed(_) => "sign_failed",
            Self::ReadFailed(_) => "read_failed",
            Self::OrchestratorGetFailed(_) => "orchestrator_get_failed",
            Self::OrchestratorDeleteFailed(_) => "orchestrator_delete_failed",
            Self::Cancelled(_) => "cancelled",
        }
    }
}
