// crates/pipeline-collector-config/src/lib.rs
// ============================================================================
// Module: Pipeline Collector Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for pipeline-collector.toml semantics.
// Dependencies: pipeline-collector-core, serde, toml
// ============================================================================

//! ## Overview
//! `pipeline-collector-config` defines the configuration model for the
//! collector: object storage, the audit trail, and collection tunables. Loading
//! is strict and fails closed on oversized, non-UTF-8, or inconsistent input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
