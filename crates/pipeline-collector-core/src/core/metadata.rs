// crates/pipeline-collector-core/src/core/metadata.rs
// ============================================================================
// Module: Run Metadata
// Description: Structured metadata snapshot for a collected pipeline run.
// Purpose: Join the live run with platform context into one immutable record.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`resolve_metadata`] is a pure function of the run and the platform
//! context. It never fails: platform fields that are absent resolve to empty
//! strings so a partially described run can still be collected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::run::PipelineRun;

// ============================================================================
// SECTION: Platform Context
// ============================================================================

/// Platform-side description of the run being collected.
///
/// Every field is optional; the orchestrator run may outlive the records that
/// described it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContext {
    /// Application name.
    #[serde(default)]
    pub application: Option<String>,
    /// Application identifier.
    #[serde(default)]
    pub application_id: Option<u64>,
    /// Cluster name.
    #[serde(default)]
    pub cluster: Option<String>,
    /// Cluster identifier.
    #[serde(default)]
    pub cluster_id: Option<u64>,
    /// Environment name.
    #[serde(default)]
    pub environment: Option<String>,
    /// Identity of the operator who triggered the run.
    #[serde(default)]
    pub operator: Option<String>,
    /// Platform record identifier of the pipeline run.
    #[serde(default)]
    pub pipeline_run_id: Option<u64>,
}

// ============================================================================
// SECTION: Metadata Types
// ============================================================================

/// Summary of the run outcome embedded in [`RunMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Run name.
    pub name: String,
    /// Pipeline name.
    pub pipeline: String,
    /// Result label.
    pub result: String,
    /// Start time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    /// Completion time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_time: Option<OffsetDateTime>,
    /// Duration in whole seconds.
    pub duration_seconds: u64,
}

/// Immutable metadata snapshot resolved once per collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// Application name.
    pub application: String,
    /// Application identifier rendered as a string.
    pub application_id: String,
    /// Cluster name.
    pub cluster: String,
    /// Cluster identifier rendered as a string.
    pub cluster_id: String,
    /// Environment name.
    pub environment: String,
    /// Operator identity.
    pub operator: String,
    /// Run creation time (RFC 3339), empty when unknown.
    pub creation_timestamp: String,
    /// Run outcome summary.
    pub pipeline_run: RunSummary,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Builds the metadata snapshot for a run.
#[must_use]
pub fn resolve_metadata(run: &PipelineRun, context: &PlatformContext) -> RunMetadata {
    RunMetadata {
        application: context.application.clone().unwrap_or_default(),
        application_id: id_string(context.application_id),
        cluster: context.cluster.clone().unwrap_or_default(),
        cluster_id: id_string(context.cluster_id),
        environment: context.environment.clone().unwrap_or_default(),
        operator: context.operator.clone().unwrap_or_default(),
        creation_timestamp: run
            .creation_timestamp
            .and_then(|created| created.format(&Rfc3339).ok())
            .unwrap_or_default(),
        pipeline_run: RunSummary {
            name: run.name.clone(),
            pipeline: run.pipeline.clone(),
            result: run.status.result.clone(),
            start_time: run.status.start_time,
            completion_time: run.status.completion_time,
            duration_seconds: run.duration_seconds(),
        },
    }
}

/// Renders an optional numeric identifier, empty when absent.
fn id_string(id: Option<u64>) -> String {
    id.map(|value| value.to_string()).unwrap_or_default()
}
