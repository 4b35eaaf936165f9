// crates/pipeline-collector-service/src/lib.rs
// ============================================================================
// Module: Pipeline Collector Service Library
// Description: Composition root for the pipeline-run collector.
// Purpose: Wire configuration, storage, audit trail, and telemetry together.
// Dependencies: pipeline-collector-{config,core,s3}, time, tracing-subscriber
// ============================================================================

//! ## Overview
//! The service crate owns every process-wide resource: the S3 client, the
//! rotating audit file, and the tracing subscriber. It builds one
//! [`CollectorService`] from a validated [`CollectorConfig`] and an
//! orchestrator adapter supplied by the embedding process.
//!
//! [`CollectorConfig`]: pipeline_collector_config::CollectorConfig

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod error;
pub mod service;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::RotatingFileAuditSink;
pub use audit::RotationPolicy;
pub use error::ServiceError;
pub use service::CollectorService;
pub use telemetry::init_tracing;
