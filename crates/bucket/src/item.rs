//! Descriptors of stored entries.
//!
//! An [`Item`] is cheap: a name, a directory flag, whatever the producing
//! operation already knew (size, modification time, mode) and a weak handle
//! back to its bucket. The rest of the metadata (etag, user metadata, backend
//! data) is materialized on first use with a single `stat`, shared by every
//! clone of the item.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::bucket::{BoxReader, Bucket};
use crate::error::{BucketError, Result};
use crate::options::Metadata;

/// Backend specific data carried by a materialized item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSys {
    Local { inode: u64, readonly: bool },
    Remote { version: Option<String> },
}

/// Snapshot of everything a `stat` returns for one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemInfo {
    pub size: u64,
    pub mod_time: Option<DateTime<Utc>>,
    pub mode: u32,
    pub etag: Option<String>,
    pub metadata: Metadata,
    pub sys: Option<ItemSys>,
}

#[derive(Debug, Clone)]
pub struct Item {
    bucket: Weak<dyn Bucket>,
    name: String,
    dir: bool,
    size: Option<u64>,
    mod_time: Option<DateTime<Utc>>,
    mode: Option<u32>,
    info: Arc<OnceCell<ItemInfo>>,
}

impl Item {
    /// An item whose metadata is unknown until first asked for.
    pub fn new(bucket: Weak<dyn Bucket>, name: impl Into<String>, dir: bool) -> Self {
        Self {
            bucket,
            name: name.into(),
            dir,
            size: None,
            mod_time: None,
            mode: None,
            info: Arc::new(OnceCell::new()),
        }
    }

    /// An item for `name` in `bucket`; names ending with the bucket's
    /// separator denote directories.
    pub fn for_name(bucket: &Arc<dyn Bucket>, name: &str) -> Self {
        let dir = bucket.path_separator().is_dir_name(name);
        Self::new(Arc::downgrade(bucket), name, dir)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_mod_time(mut self, mod_time: DateTime<Utc>) -> Self {
        self.mod_time = Some(mod_time);
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Mark the item as fully materialized; no `stat` will be issued for it.
    pub fn with_info(mut self, info: ItemInfo) -> Self {
        self.size = Some(info.size);
        self.mod_time = info.mod_time;
        self.mode = Some(info.mode);
        self.info = Arc::new(OnceCell::new_with(Some(info)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.dir
    }

    pub fn size(&self) -> u64 {
        match self.info.get() {
            Some(info) => info.size,
            None => self.size.unwrap_or_default(),
        }
    }

    pub fn mod_time(&self) -> Option<DateTime<Utc>> {
        match self.info.get() {
            Some(info) => info.mod_time,
            None => self.mod_time,
        }
    }

    pub fn mode(&self) -> u32 {
        match self.info.get() {
            Some(info) => info.mode,
            None => self.mode.unwrap_or_default(),
        }
    }

    /// Backend data, if the item has been materialized.
    pub fn sys(&self) -> Option<&ItemSys> {
        self.info.get().and_then(|info| info.sys.as_ref())
    }

    pub fn is_materialized(&self) -> bool {
        self.info.initialized()
    }

    /// The full metadata snapshot, fetched with one `stat` the first time.
    ///
    /// Concurrent callers share the in-flight fetch. A failed fetch is not
    /// remembered: the next call tries again. Whether the item is a
    /// directory is fixed when it is created; if the entry has since changed
    /// kind the fetch fails with `IsADirectory` or `NotADirectory`.
    pub async fn info(&self) -> Result<&ItemInfo> {
        self.info.get_or_try_init(|| self.fetch()).await
    }

    pub async fn etag(&self) -> Result<Option<&str>> {
        Ok(self.info().await?.etag.as_deref())
    }

    pub async fn metadata(&self) -> Result<&Metadata> {
        Ok(&self.info().await?.metadata)
    }

    pub async fn open(&self) -> Result<BoxReader> {
        self.bucket()?.new_reader(&self.name).await
    }

    pub fn bucket(&self) -> Result<Arc<dyn Bucket>> {
        self.bucket
            .upgrade()
            .ok_or_else(|| BucketError::BucketGone(self.name.clone()))
    }

    /// Whether this item was produced by `bucket`.
    pub fn belongs_to(&self, bucket: &dyn Bucket) -> bool {
        match self.bucket.upgrade() {
            Some(owner) => std::ptr::addr_eq(Arc::as_ptr(&owner), bucket as *const dyn Bucket),
            None => false,
        }
    }

    /// Whatever is known right now, without fetching.
    pub(crate) fn snapshot(&self) -> ItemInfo {
        match self.info.get() {
            Some(info) => info.clone(),
            None => ItemInfo {
                size: self.size(),
                mod_time: self.mod_time,
                mode: self.mode(),
                ..ItemInfo::default()
            },
        }
    }

    async fn fetch(&self) -> Result<ItemInfo> {
        let bucket = self.bucket()?;
        debug!(name = %self.name, bucket = %bucket.name(), "materializing item metadata");
        let stat = bucket.stat(&self.name).await?;
        if stat.is_dir() != self.dir {
            let path = self.name.clone();
            return Err(if self.dir {
                BucketError::NotADirectory { path }
            } else {
                BucketError::IsADirectory { path }
            });
        }
        Ok(stat.snapshot())
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.dir == other.dir
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.dir.hash(state);
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
