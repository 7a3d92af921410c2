//! Construction of the object stores behind remote buckets.

use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::{ObjectStore, RetryConfig};

use crate::config::S3Config;
use crate::error::{BucketError, Result};

/// S3 or an S3-compatible service (MinIO, R2, ...).
pub fn s3_store(config: &S3Config) -> Result<Arc<dyn ObjectStore>> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket)
        .with_allow_http(config.allow_http);
    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }
    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }
    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }
    if let Some(token) = &config.session_token {
        builder = builder.with_token(token);
    }
    if let Some(max_retries) = config.max_retries {
        builder = builder.with_retry(RetryConfig {
            max_retries,
            ..RetryConfig::default()
        });
    }

    let store = builder
        .build()
        .map_err(|err| BucketError::Config(format!("s3 bucket {}: {err}", config.bucket)))?;
    Ok(Arc::new(store))
}

/// Process-local store, mostly for tests and dry runs.
pub fn memory_store() -> Arc<dyn ObjectStore> {
    Arc::new(InMemory::new())
}
