// crates/pipeline-collector-s3/src/s3_store.rs
// ============================================================================
// Module: S3 Object Store
// Description: aws-sdk-s3 backed implementation of the object-store contract.
// Purpose: Persist logs and snapshots in S3-compatible storage.
// Dependencies: aws-config, aws-sdk-s3, pipeline-collector-{config,core}, url
// ============================================================================

//! ## Overview
//! [`S3ObjectStore`] maps the collector's logical keys onto a bucket and an
//! optional key prefix. Snapshot tags travel in the `x-amz-tagging` header as
//! URL-encoded pairs. Presigned URLs are SigV4 query-signed GET requests.
//!
//! SigV4 caps presigned URL validity at seven days. Longer requests are
//! clamped to that bound and logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use pipeline_collector_config::ObjectStoreConfig;
use pipeline_collector_config::normalize_object_store_prefix;
use pipeline_collector_core::ObjectStore;
use pipeline_collector_core::ObjectStoreError;
use pipeline_collector_core::ObjectTags;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Longest validity SigV4 accepts for a presigned URL.
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24 * 7);

// ============================================================================
// SECTION: Store
// ============================================================================

/// S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    /// Underlying S3 client.
    client: Client,
    /// Bucket name.
    bucket: String,
    /// Normalized key prefix, empty or ending in `/`.
    prefix: String,
}

impl S3ObjectStore {
    /// Builds a store from configuration, loading credentials and region from
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Invalid`] when the configuration is invalid.
    pub async fn connect(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        config.validate().map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.trim());
        }
        let shared_config = loader.load().await;
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        let client = Client::from_conf(s3_builder.build());
        Self::from_client(client, config.bucket.trim(), config.prefix.as_deref().unwrap_or(""))
    }

    /// Wraps an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Invalid`] for an empty bucket or an unsafe
    /// prefix.
    pub fn from_client(
        client: Client,
        bucket: impl Into<String>,
        prefix: &str,
    ) -> Result<Self, ObjectStoreError> {
        let bucket = bucket.into();
        if bucket.is_empty() {
            return Err(ObjectStoreError::Invalid("bucket must be set".to_string()));
        }
        Ok(Self {
            client,
            bucket,
            prefix: normalize_prefix(prefix)?,
        })
    }

    /// Applies the configured prefix to a key.
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() { key.to_string() } else { format!("{}{}", self.prefix, key) }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        tags: &ObjectTags,
    ) -> Result<(), ObjectStoreError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.prefixed_key(key))
            .body(ByteStream::from(bytes));
        if !tags.is_empty() {
            request = request.tagging(tagging_header(tags));
        }
        request.send().await.map_err(|err| ObjectStoreError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.prefixed_key(key))
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                service if service.is_no_such_key() => ObjectStoreError::NotFound(key.to_string()),
                service => ObjectStoreError::Backend(service.to_string()),
            })?;
        let body =
            output.body.collect().await.map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn signed_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        let presigning = PresigningConfig::expires_in(clamp_presign_expiry(expires_in))
            .map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.prefixed_key(key))
            .presigned(presigning)
            .await
            .map_err(|err| ObjectStoreError::Backend(err.to_string()))?;
        Ok(request.uri().to_string())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encodes tags as the URL query string S3 expects in `x-amz-tagging`.
pub(crate) fn tagging_header(tags: &ObjectTags) -> String {
    url::form_urlencoded::Serializer::new(String::new()).extend_pairs(tags.iter()).finish()
}

/// Bounds a requested presign validity to what SigV4 accepts.
pub(crate) fn clamp_presign_expiry(requested: Duration) -> Duration {
    if requested > MAX_PRESIGN_EXPIRY {
        warn!(
            requested_secs = requested.as_secs(),
            max_secs = MAX_PRESIGN_EXPIRY.as_secs(),
            "presigned url expiry clamped"
        );
        return MAX_PRESIGN_EXPIRY;
    }
    requested
}

/// Normalizes a root prefix string for object storage.
fn normalize_prefix(raw: &str) -> Result<String, ObjectStoreError> {
    normalize_object_store_prefix(raw).map_err(|err| ObjectStoreError::Invalid(err.to_string()))
}
