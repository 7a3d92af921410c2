use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::bucket::{Bucket, BucketManager};
use crate::error::{BucketError, Result};
#[cfg(unix)]
use crate::options::DEFAULT_DIR_MODE;

/// Creates, empties and deletes the root directory of a [`LocalBucket`].
///
/// [`LocalBucket`]: super::LocalBucket
#[derive(Debug, Clone)]
pub struct LocalBucketManager {
    bucket: Arc<super::LocalBucket>,
}

impl LocalBucketManager {
    pub fn new(bucket: Arc<super::LocalBucket>) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl BucketManager for LocalBucketManager {
    async fn create(&self) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DEFAULT_DIR_MODE);
        builder
            .create(self.bucket.root())
            .await
            .map_err(|err| BucketError::from_io(err, self.bucket.name()))?;
        info!(root = %self.bucket.name(), "created local bucket");
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        match fs::remove_dir_all(self.bucket.root()).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(BucketError::from_io(err, self.bucket.name())),
        }
        info!(root = %self.bucket.name(), "removed local bucket");
        Ok(())
    }

    async fn clean(&self) -> Result<()> {
        self.bucket.remove_all("/").await
    }
}
