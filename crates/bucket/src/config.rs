//! Bucket configuration, usually loaded from a TOML file.
//!
//! ```toml
//! [backend]
//! type = "s3"
//! bucket = "backups"
//! endpoint = "http://localhost:9000"
//! allow_http = true
//!
//! [copy]
//! workers = 16
//!
//! [consistency]
//! max_attempts = 30
//! interval_ms = 200
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bucket::{Bucket, BucketManager};
use crate::error::{BucketError, Result};
use crate::local::{LocalBucket, LocalBucketManager};
use crate::options::CopyConfig;
use crate::remote::{memory_store, s3_store, ConsistencyConfig, RemoteBucket, RemoteBucketManager};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Allow plain HTTP endpoints (local MinIO and the like).
    #[serde(default)]
    pub allow_http: bool,
    #[serde(default)]
    pub max_retries: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// A directory on the local filesystem.
    Local { root: PathBuf },
    S3(S3Config),
    /// A process-local object store, empty at start.
    Memory {
        #[serde(default = "default_memory_name")]
        name: String,
    },
}

fn default_memory_name() -> String {
    "memory".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub copy: CopyConfig,
    #[serde(default)]
    pub consistency: ConsistencyConfig,
}

/// A configured bucket and the manager for its container.
#[derive(Debug, Clone)]
pub struct OpenedBucket {
    pub bucket: Arc<dyn Bucket>,
    pub manager: Arc<dyn BucketManager>,
}

impl Config {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            backend,
            copy: CopyConfig::default(),
            consistency: ConsistencyConfig::default(),
        }
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(BackendConfig::Local { root: root.into() })
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|err| BucketError::Config(err.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| BucketError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| BucketError::Config(err.to_string()))
    }

    /// Build the bucket described by this configuration.
    pub fn open(&self) -> Result<OpenedBucket> {
        let opened = match &self.backend {
            BackendConfig::Local { root } => {
                let bucket = LocalBucket::with_copy_config(root, self.copy);
                OpenedBucket {
                    manager: Arc::new(LocalBucketManager::new(bucket.clone())),
                    bucket,
                }
            }
            BackendConfig::S3(s3) => {
                let bucket = RemoteBucket::with_config(
                    s3.bucket.clone(),
                    s3_store(s3)?,
                    self.consistency,
                    self.copy,
                );
                OpenedBucket {
                    manager: Arc::new(RemoteBucketManager::new(bucket.clone())),
                    bucket,
                }
            }
            BackendConfig::Memory { name } => {
                let bucket = RemoteBucket::with_config(
                    name.clone(),
                    memory_store(),
                    self.consistency,
                    self.copy,
                );
                OpenedBucket {
                    manager: Arc::new(RemoteBucketManager::new(bucket.clone())),
                    bucket,
                }
            }
        };
        debug!(bucket = %opened.bucket.name(), "opened bucket");
        Ok(opened)
    }
}
