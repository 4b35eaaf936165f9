// crates/pipeline-collector-s3/src/lib.rs
// ============================================================================
// Module: Pipeline Collector S3 Library
// Description: S3-compatible object store for collected runs.
// Purpose: Implement the core object-store contract over aws-sdk-s3.
// Dependencies: aws-config, aws-sdk-s3, pipeline-collector-{config,core}
// ============================================================================

//! ## Overview
//! `pipeline-collector-s3` is the production [`ObjectStore`] adapter. It
//! writes tagged objects, reads them back with missing-key detection, and
//! issues presigned GET URLs.
//!
//! [`ObjectStore`]: pipeline_collector_core::ObjectStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod s3_store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use s3_store::MAX_PRESIGN_EXPIRY;
pub use s3_store::S3ObjectStore;
