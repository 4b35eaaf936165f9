// crates/pipeline-collector-core/src/runtime/persister.rs
// ============================================================================
// Module: Object Persister
// Description: Key computation, signed URLs, and tagged writes over an object store.
// Purpose: Map object-store capabilities onto the collector's error taxonomy.
// Dependencies: crate::{core, interfaces}, bytes, tokio-util
// ============================================================================

//! ## Overview
//! [`ObjectPersister`] is the only path from the collector and the retriever
//! to object storage. It derives keys, requests signed URLs, and tags snapshot
//! objects with the run's identifying metadata. Every call observes the
//! caller's cancellation token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::core::metadata::RunMetadata;
use crate::core::storage_key::ObjectKind;
use crate::core::storage_key::StorageKey;
use crate::core::storage_key::compute_key;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::ObjectTags;
use crate::runtime::cancel::with_cancel;
use crate::runtime::error::CollectorError;
use crate::runtime::error::ResourceKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default validity of signed URLs (30 days).
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// Tag key for the application name.
const TAG_APPLICATION: &str = "application";
/// Tag key for the cluster name.
const TAG_CLUSTER: &str = "cluster";
/// Tag key for the environment name.
const TAG_ENVIRONMENT: &str = "environment";
/// Tag key for the operator identity.
const TAG_OPERATOR: &str = "operator";
/// Tag key for the run name.
const TAG_PIPELINE_RUN: &str = "pipelineRun";
/// Tag key for the pipeline name.
const TAG_PIPELINE: &str = "pipeline";
/// Tag key for the run result.
const TAG_RESULT: &str = "result";
/// Tag key for the run duration in seconds.
const TAG_DURATION: &str = "duration";
/// Tag key for the run creation time.
const TAG_CREATION_TIMESTAMP: &str = "creationTimestamp";

// ============================================================================
// SECTION: Persister
// ============================================================================

/// Object-store facade used by collection and retrieval.
#[derive(Clone)]
pub struct ObjectPersister {
    /// Backing store.
    store: Arc<dyn ObjectStore>,
}

impl ObjectPersister {
    /// Creates a persister over a store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
        }
    }

    /// Returns the bucket of the backing store.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Computes the key for an object of `kind`.
    #[must_use]
    pub fn compute_key(
        &self,
        kind: ObjectKind,
        metadata: &RunMetadata,
        now: OffsetDateTime,
    ) -> StorageKey {
        compute_key(kind, metadata, now)
    }

    /// Requests a signed URL valid for `expiry`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::SignFailed`] when the store cannot sign.
    pub async fn issue_url(
        &self,
        key: &StorageKey,
        expiry: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, CollectorError> {
        with_cancel(cancel, "sign url", self.store.signed_url(key.as_str(), expiry))
            .await?
            .map_err(|err| CollectorError::SignFailed(err.to_string()))
    }

    /// Writes bytes under `key` with the given tags.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::StorePutFailed`] on any backend error.
    pub async fn put(
        &self,
        key: &StorageKey,
        bytes: Bytes,
        tags: &ObjectTags,
        cancel: &CancellationToken,
    ) -> Result<(), CollectorError> {
        with_cancel(cancel, "put object", self.store.put(key.as_str(), bytes, tags))
            .await?
            .map_err(|err| CollectorError::StorePutFailed(err.to_string()))
    }

    /// Reads the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::NotFound`] tagged with `kind` for a missing key
    /// and [`CollectorError::StoreGetFailed`] otherwise.
    pub async fn get(
        &self,
        key: &StorageKey,
        kind: ResourceKind,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CollectorError> {
        with_cancel(cancel, "get object", self.store.get(key.as_str())).await?.map_err(|err| {
            match err {
                ObjectStoreError::NotFound(message) => CollectorError::NotFound(kind, message),
                other => CollectorError::StoreGetFailed(other.to_string()),
            }
        })
    }
}

// ============================================================================
// SECTION: Tags
// ============================================================================

/// Builds the fixed tag set attached to snapshot objects.
#[must_use]
pub fn snapshot_tags(metadata: &RunMetadata) -> ObjectTags {
    let summary = &metadata.pipeline_run;
    [
        (TAG_APPLICATION, metadata.application.clone()),
        (TAG_CLUSTER, metadata.cluster.clone()),
        (TAG_ENVIRONMENT, metadata.environment.clone()),
        (TAG_OPERATOR, metadata.operator.clone()),
        (TAG_PIPELINE_RUN, summary.name.clone()),
        (TAG_PIPELINE, summary.pipeline.clone()),
        (TAG_RESULT, summary.result.clone()),
        (TAG_DURATION, summary.duration_seconds.to_string()),
        (TAG_CREATION_TIMESTAMP, metadata.creation_timestamp.clone()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}
