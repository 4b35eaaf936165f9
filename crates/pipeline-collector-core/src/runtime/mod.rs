// crates/pipeline-collector-core/src/runtime/mod.rs
// ============================================================================
// Module: Pipeline Collector Runtime
// Description: Collection pipeline, persistence helpers, and read-path fallback.
// Purpose: Sequence log merging, object persistence, audit, and deletion.
// Dependencies: crate::{core, interfaces}, tokio, tokio-util, tracing
// ============================================================================

//! ## Overview
//! Runtime modules implement the collect-then-delete workflow and the
//! persisted-first read path. All backend calls observe a caller-supplied
//! [`tokio_util::sync::CancellationToken`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

mod cancel;
pub mod collector;
pub mod error;
pub mod memory;
pub mod merge;
pub mod persister;
pub mod retrieval;
mod timing;
pub mod truncate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use collector::CollectionSettings;
pub use collector::Collector;
pub use error::CollectorError;
pub use error::ResourceKind;
pub use memory::InMemoryAuditSink;
pub use memory::InMemoryObjectStore;
pub use memory::InMemoryOrchestrator;
pub use memory::ScriptedLog;
pub use memory::StoredObject;
pub use merge::merge_log_streams;
pub use persister::DEFAULT_URL_EXPIRY;
pub use persister::ObjectPersister;
pub use persister::snapshot_tags;
pub use retrieval::RunLog;
pub use retrieval::RunRetriever;
pub use truncate::AuditLimits;
pub use truncate::DEFAULT_AUDIT_LIMIT_BYTES;
pub use truncate::DEFAULT_AUDIT_SLICE_BYTES;
pub use truncate::TRUNCATION_MARKER;
pub use truncate::truncate_middle;
