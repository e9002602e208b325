//! S3-backed object store.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use stash_core::storage::validate_key;
use stash_core::{ListWindow, ObjectStore, ObjectSummary, StorageError};

use crate::sort_newest_first;

/// Bucket and endpoint settings. Credentials and region come from the
/// standard AWS environment (`AWS_ACCESS_KEY_ID`, `AWS_REGION`, profiles).
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Custom endpoint for S3-compatible services. Enables path-style
    /// addressing.
    pub endpoint_url: Option<String>,
}

pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Build a store from the ambient AWS configuration.
    pub async fn connect(config: S3Config) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(
            bucket = %config.bucket,
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            "S3 object store configured"
        );

        Self::from_client(aws_sdk_s3::Client::from_conf(builder.build()), config.bucket)
    }

    pub fn from_client(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn backend_error<E: std::error::Error>(err: E) -> StorageError {
    StorageError::Backend(DisplayErrorContext(err).to_string())
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(backend_error)?;

        tracing::debug!(bucket = %self.bucket, key, size, "Stored object");
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
        window: ListWindow,
    ) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(backend_error)?;
            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                let last_modified = object.last_modified().and_then(to_chrono);
                if !window.contains(last_modified) {
                    continue;
                }
                objects.push(ObjectSummary {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified,
                });
            }
        }

        sort_newest_first(&mut objects);
        Ok(objects)
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        let presigning = PresigningConfig::expires_in(ttl).map_err(backend_error)?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(backend_error)?;
        Ok(request.uri().to_string())
    }
}
