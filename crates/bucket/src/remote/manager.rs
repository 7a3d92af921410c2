use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::bucket::{Bucket, BucketManager};
use crate::error::{BucketError, Result};

use super::RemoteBucket;

/// Lifecycle of a remote bucket's contents.
///
/// Creating or deleting the container itself is up to the provider's own
/// tooling: `create` only checks that the container is reachable and
/// `remove` empties it.
#[derive(Debug, Clone)]
pub struct RemoteBucketManager {
    bucket: Arc<RemoteBucket>,
}

impl RemoteBucketManager {
    pub fn new(bucket: Arc<RemoteBucket>) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl BucketManager for RemoteBucketManager {
    async fn create(&self) -> Result<()> {
        self.bucket
            .store()
            .list_with_delimiter(None)
            .await
            .map_err(|err| BucketError::from_store(err, self.bucket.name()))?;
        info!(bucket = %self.bucket.name(), "remote bucket reachable");
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        self.clean().await?;
        info!(bucket = %self.bucket.name(), "emptied remote bucket");
        Ok(())
    }

    async fn clean(&self) -> Result<()> {
        self.bucket.remove_all("/").await
    }
}
