// crates/pipeline-collector-core/src/core/run.rs
// ============================================================================
// Module: Pipeline Run Definition
// Description: The orchestrator's view of a single pipeline run.
// Purpose: Carry the run definition that is snapshotted and read back.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! [`PipelineRun`] is the run definition as last observed from the
//! orchestrator. The fields the collector relies on are typed; the complete
//! orchestrator-native document rides along in [`PipelineRun::manifest`] so a
//! snapshot preserves everything the orchestrator reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pipeline run definition as reported by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    /// Run name, unique within its namespace.
    pub name: String,
    /// Orchestrator namespace holding the run.
    #[serde(default)]
    pub namespace: String,
    /// Name of the pipeline this run executes.
    #[serde(default)]
    pub pipeline: String,
    /// Creation time recorded by the orchestrator.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub creation_timestamp: Option<OffsetDateTime>,
    /// Run labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Run annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Completion status.
    #[serde(default)]
    pub status: RunStatus,
    /// Full orchestrator-native definition.
    #[serde(default)]
    pub manifest: Value,
}

/// Completion status of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    /// Result label (for example `ok`, `failed`, `cancelled`).
    #[serde(default)]
    pub result: String,
    /// Time the run started.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    /// Time the run completed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_time: Option<OffsetDateTime>,
}

impl PipelineRun {
    /// Creates a run definition with the given name and an empty status.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            pipeline: String::new(),
            creation_timestamp: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            status: RunStatus::default(),
            manifest: Value::Null,
        }
    }

    /// Returns the run duration in whole seconds.
    ///
    /// Missing timestamps or a completion before the start yield zero.
    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        match (self.status.start_time, self.status.completion_time) {
            (Some(start), Some(end)) => {
                u64::try_from((end - start).whole_seconds()).unwrap_or_default()
            }
            _ => 0,
        }
    }
}
