// crates/pipeline-collector-core/src/core/mod.rs
// ============================================================================
// Module: Pipeline Collector Core Types
// Description: Run definitions, metadata snapshots, keys, and collection records.
// Purpose: Provide stable, serializable types shared by every collector stage.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types describe what the collector reads (pipeline runs and platform
//! context) and what it produces (storage keys, snapshot envelopes, audit
//! records and collection results). They carry no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod metadata;
pub mod records;
pub mod run;
pub mod storage_key;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::CorrelationId;
pub use metadata::PlatformContext;
pub use metadata::RunMetadata;
pub use metadata::RunSummary;
pub use metadata::resolve_metadata;
pub use records::AuditRecord;
pub use records::CollectResult;
pub use records::PersistedRun;
pub use records::RunSnapshotEnvelope;
pub use run::PipelineRun;
pub use run::RunStatus;
pub use storage_key::ObjectKind;
pub use storage_key::StorageKey;
pub use storage_key::compute_key;
