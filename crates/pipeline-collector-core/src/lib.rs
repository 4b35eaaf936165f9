// crates/pipeline-collector-core/src/lib.rs
// ============================================================================
// Module: Pipeline Collector Core Library
// Description: Public API surface for the pipeline run collector.
// Purpose: Expose core types, capability interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Pipeline Collector core captures the outputs of a finished pipeline run:
//! it merges the live log streams into one ordered text, persists the log and
//! a run snapshot to object storage, issues signed retrieval URLs, appends a
//! bounded audit line, and only then removes the live orchestrator resource.
//! Backends are reached exclusively through the interfaces in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::AuditError;
pub use interfaces::AuditSink;
pub use interfaces::FLUSH_MARKER;
pub use interfaces::LogLine;
pub use interfaces::LogStreams;
pub use interfaces::ObjectStore;
pub use interfaces::ObjectStoreError;
pub use interfaces::ObjectTags;
pub use interfaces::Orchestrator;
pub use interfaces::OrchestratorError;
pub use runtime::AuditLimits;
pub use runtime::CollectionSettings;
pub use runtime::Collector;
pub use runtime::CollectorError;
pub use runtime::ObjectPersister;
pub use runtime::ResourceKind;
pub use runtime::RunLog;
pub use runtime::RunRetriever;
