//! Polling that hides the object store's eventual consistency window.

use std::time::Duration;

use object_store::path::Path;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BucketError, Result};

/// How long mutating calls wait for their effect to become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval_ms: 100,
        }
    }
}

impl ConsistencyConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

pub(crate) async fn wait_until_exists(
    store: &dyn ObjectStore,
    path: &Path,
    config: &ConsistencyConfig,
) -> Result<()> {
    poll(store, path, config, true).await
}

pub(crate) async fn wait_until_gone(
    store: &dyn ObjectStore,
    path: &Path,
    config: &ConsistencyConfig,
) -> Result<()> {
    poll(store, path, config, false).await
}

async fn poll(
    store: &dyn ObjectStore,
    path: &Path,
    config: &ConsistencyConfig,
    present: bool,
) -> Result<()> {
    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        let visible = match store.head(path).await {
            Ok(_) => true,
            Err(object_store::Error::NotFound { .. }) => false,
            Err(err) => return Err(BucketError::Store(err)),
        };
        if visible == present {
            return Ok(());
        }
        debug!(path = %path, attempt, present, "waiting for object store consistency");
        if attempt < attempts {
            tokio::time::sleep(config.interval()).await;
        }
    }
    Err(BucketError::ConsistencyTimeout {
        path: path.to_string(),
        attempts,
    })
}
