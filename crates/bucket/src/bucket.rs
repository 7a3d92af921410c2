//! Contracts shared by every backend.
//!
//! [`Bucket`] is the full operation set. Listing and walking are optional
//! capabilities: a backend advertises them through [`Bucket::as_listable`]
//! and [`Bucket::as_walkable`], which are fixed per backend type, so callers
//! check for the capability instead of assuming it.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{BucketError, Result};
use crate::item::Item;
use crate::options::{CopyOptions, WriteOptions};
use crate::path::Separator;

pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// A writer whose content becomes visible once `shutdown()` completes.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// What a walk visitor wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkSignal {
    Continue,
    /// Do not descend into the directory just visited. No-op for files.
    SkipSubtree,
    /// End the walk now. The walk still reports success.
    Stop,
}

/// Walk visitor. Receives every entry in pre-order, or the error raised
/// while listing an entry below the walk root.
pub type Visitor<'v> = dyn FnMut(Result<&Item>) -> WalkSignal + Send + 'v;

#[async_trait]
pub trait Bucket: fmt::Debug + Send + Sync {
    /// Root name of the bucket: a directory path or a container name.
    fn name(&self) -> &str;

    fn path_separator(&self) -> Separator;

    async fn read(&self, name: &str) -> Result<Bytes>;

    async fn new_reader(&self, name: &str) -> Result<BoxReader>;

    /// Store `data` under `name`, replacing any previous content. Returns the
    /// number of bytes written.
    async fn write(&self, name: &str, data: Bytes, opts: WriteOptions) -> Result<usize>;

    async fn new_writer(&self, name: &str, opts: WriteOptions) -> Result<BoxWriter>;

    async fn exists(&self, name: &str) -> Result<bool> {
        match self.stat(name).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove a file or an empty directory.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Remove `name` and everything below it. Missing paths are not an error.
    async fn remove_all(&self, name: &str) -> Result<()>;

    /// Metadata for `name`. The returned item is fully materialized.
    async fn stat(&self, name: &str) -> Result<Item>;

    async fn mkdir(&self, name: &str, opts: WriteOptions) -> Result<()>;

    async fn mkdir_all(&self, name: &str, opts: WriteOptions) -> Result<()>;

    async fn chmod(&self, name: &str, mode: u32) -> Result<()>;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Copy a single entry, possibly from another bucket, to `to` in this
    /// bucket. Copying a directory creates the directory only.
    async fn copy(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()>;

    /// Copy an entry and, for a directory, its whole subtree.
    async fn copy_all(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()>;

    async fn copy2(&self, from: &str, to: &str, opts: CopyOptions) -> Result<()> {
        let item = self.stat(from).await?;
        self.copy(&item, to, opts).await
    }

    async fn copy_all2(&self, from: &str, to: &str, opts: CopyOptions) -> Result<()> {
        let item = self.stat(from).await?;
        self.copy_all(&item, to, opts).await
    }

    fn as_listable(&self) -> Option<&dyn Listable> {
        None
    }

    fn as_walkable(&self) -> Option<&dyn Walkable> {
        None
    }
}

#[async_trait]
pub trait Listable: Send + Sync {
    /// Iterate over one directory level. A file name yields that file alone.
    async fn items(&self, name: &str) -> Result<Box<dyn ListIterator>>;
}

#[async_trait]
pub trait ListIterator: Send {
    /// Next entry, or `None` once the level is exhausted.
    async fn next(&mut self) -> Result<Option<Item>>;

    /// Release whatever the iterator holds open. Safe to call more than once.
    async fn close(&mut self);
}

#[async_trait]
pub trait Walkable: Send + Sync {
    /// Depth-first pre-order walk rooted at `dir`. A missing root completes
    /// with no visits, a file root visits that file once.
    async fn walk(&self, dir: &str, visitor: &mut Visitor<'_>) -> Result<()>;
}

/// Lifecycle of the container behind a bucket.
#[async_trait]
pub trait BucketManager: fmt::Debug + Send + Sync {
    async fn create(&self) -> Result<()>;

    async fn remove(&self) -> Result<()>;

    /// Empty the container without removing it.
    async fn clean(&self) -> Result<()>;
}

/// Drain an iterator into a vector, closing it on every path.
pub async fn collect_items(mut iter: Box<dyn ListIterator>) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let result = loop {
        match iter.next().await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => break Ok(items),
            Err(err) => break Err(err),
        }
    };
    iter.close().await;
    result
}

pub(crate) fn not_supported(op: &'static str, backend: &'static str) -> BucketError {
    BucketError::NotSupported { op, backend }
}
