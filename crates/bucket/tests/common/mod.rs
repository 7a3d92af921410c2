//! Shared fixtures for the bucket integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;

use unibucket::local::{LocalBucket, LocalBucketManager};
use unibucket::remote::{memory_store, ConsistencyConfig, RemoteBucket, RemoteBucketManager};
use unibucket::{
    BoxReader, BoxWriter, Bucket, BucketError, BucketManager, CopyConfig, CopyOptions, Item,
    Listable, Result, Separator, WalkSignal, Walkable, WriteOptions,
};

/// A bucket under test together with whatever keeps its storage alive.
pub struct Fixture {
    pub label: &'static str,
    pub bucket: Arc<dyn Bucket>,
    pub manager: Arc<dyn BucketManager>,
    _temp: Option<TempDir>,
}

impl Fixture {
    pub fn join(&self, elems: &[&str]) -> String {
        self.bucket.path_separator().join(elems)
    }

    /// Item name without the trailing separator directories carry.
    pub fn trim(&self, name: &str) -> String {
        let sep = self.bucket.path_separator().as_char();
        name.trim_end_matches(sep).to_string()
    }
}

/// Consistency polling tuned for the in-memory store, which is immediately
/// consistent.
pub fn fast_consistency() -> ConsistencyConfig {
    ConsistencyConfig {
        max_attempts: 5,
        interval_ms: 1,
    }
}

pub fn local_fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let bucket = LocalBucket::with_copy_config(temp.path().join("bucket"), CopyConfig { workers: 4 });
    let manager = Arc::new(LocalBucketManager::new(bucket.clone()));
    Fixture {
        label: "local",
        bucket,
        manager,
        _temp: Some(temp),
    }
}

pub fn remote_fixture() -> Fixture {
    let bucket = RemoteBucket::with_config(
        "test",
        memory_store(),
        fast_consistency(),
        CopyConfig { workers: 4 },
    );
    let manager = Arc::new(RemoteBucketManager::new(bucket.clone()));
    Fixture {
        label: "remote",
        bucket,
        manager,
        _temp: None,
    }
}

/// One created fixture per backend.
pub async fn setup_buckets() -> Vec<Fixture> {
    let fixtures = vec![local_fixture(), remote_fixture()];
    for fixture in &fixtures {
        fixture.manager.create().await.unwrap();
    }
    fixtures
}

/// Build this tree below `base`:
///
/// ```text
/// test1/
///   foo1.txt
///   foo11.txt
///   test2/
///     foo2.txt
///     test3/
///       foo3.txt foo31.txt foo32.txt
///   test3/
///     test4/
/// ```
pub async fn create_deep_dir(bucket: &dyn Bucket, base: &str) -> Result<()> {
    let sep = bucket.path_separator();
    let join = |rel: &str| sep.join(&[base, rel]);

    bucket
        .mkdir_all(&sep.directorize(&join("test1/test2/test3")), WriteOptions::default())
        .await?;
    bucket
        .mkdir_all(&sep.directorize(&join("test1/test3/test4")), WriteOptions::default())
        .await?;
    for file in [
        "test1/test2/foo2.txt",
        "test1/foo1.txt",
        "test1/foo11.txt",
        "test1/test2/test3/foo3.txt",
        "test1/test2/test3/foo31.txt",
        "test1/test2/test3/foo32.txt",
    ] {
        bucket
            .write(&join(file), Bytes::from_static(b"12345"), WriteOptions::default())
            .await?;
    }
    Ok(())
}

/// Names a walk of [`create_deep_dir`]'s tree below `base` visits, in order,
/// with trailing separators trimmed.
pub fn deep_dir_walk(sep: Separator, base: &str) -> Vec<String> {
    [
        "test1",
        "test1/foo1.txt",
        "test1/foo11.txt",
        "test1/test2",
        "test1/test2/foo2.txt",
        "test1/test2/test3",
        "test1/test2/test3/foo3.txt",
        "test1/test2/test3/foo31.txt",
        "test1/test2/test3/foo32.txt",
        "test1/test3",
        "test1/test3/test4",
    ]
    .iter()
    .map(|rel| sep.join(&[base, rel]))
    .collect()
}

/// Walk `dir`, recording trimmed names and answering each visit with
/// `decide`.
pub async fn walk_names(
    bucket: &dyn Bucket,
    dir: &str,
    mut decide: impl FnMut(&Item) -> WalkSignal + Send,
) -> Result<Vec<String>> {
    let walker = bucket.as_walkable().expect("bucket is walkable");
    let sep = bucket.path_separator().as_char();
    let mut names = Vec::new();
    walker
        .walk(dir, &mut |entry| match entry {
            Ok(item) => {
                names.push(item.name().trim_end_matches(sep).to_string());
                decide(item)
            }
            Err(err) => panic!("unexpected walk error: {err}"),
        })
        .await?;
    Ok(names)
}

/// Trimmed names of one directory level.
pub async fn list_names(bucket: &dyn Bucket, dir: &str) -> Result<Vec<String>> {
    let lister = bucket.as_listable().expect("bucket is listable");
    let sep = bucket.path_separator().as_char();
    let items = unibucket::collect_items(lister.items(dir).await?).await?;
    Ok(items
        .iter()
        .map(|item| item.name().trim_end_matches(sep).to_string())
        .collect())
}

/// Wraps a bucket and fails every single-entry copy whose destination ends
/// with `fail_on`.
#[derive(Debug)]
pub struct FailingBucket {
    inner: Arc<dyn Bucket>,
    fail_on: String,
    copies: AtomicUsize,
}

impl FailingBucket {
    pub fn new(inner: Arc<dyn Bucket>, fail_on: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_on: fail_on.into(),
            copies: AtomicUsize::new(0),
        })
    }

    /// Copies that went through to the inner bucket.
    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Bucket for FailingBucket {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn path_separator(&self) -> Separator {
        self.inner.path_separator()
    }

    async fn read(&self, name: &str) -> Result<Bytes> {
        self.inner.read(name).await
    }

    async fn new_reader(&self, name: &str) -> Result<BoxReader> {
        self.inner.new_reader(name).await
    }

    async fn write(&self, name: &str, data: Bytes, opts: WriteOptions) -> Result<usize> {
        self.inner.write(name, data, opts).await
    }

    async fn new_writer(&self, name: &str, opts: WriteOptions) -> Result<BoxWriter> {
        self.inner.new_writer(name, opts).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.inner.remove(name).await
    }

    async fn remove_all(&self, name: &str) -> Result<()> {
        self.inner.remove_all(name).await
    }

    async fn stat(&self, name: &str) -> Result<Item> {
        self.inner.stat(name).await
    }

    async fn mkdir(&self, name: &str, opts: WriteOptions) -> Result<()> {
        self.inner.mkdir(name, opts).await
    }

    async fn mkdir_all(&self, name: &str, opts: WriteOptions) -> Result<()> {
        self.inner.mkdir_all(name, opts).await
    }

    async fn chmod(&self, name: &str, mode: u32) -> Result<()> {
        self.inner.chmod(name, mode).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.inner.rename(from, to).await
    }

    async fn copy(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()> {
        if to.ends_with(&self.fail_on) {
            return Err(BucketError::Io(std::io::Error::other(format!(
                "injected failure for {to}"
            ))));
        }
        self.inner.copy(from, to, opts).await?;
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn copy_all(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()> {
        self.inner.copy_all(from, to, opts).await
    }

    fn as_listable(&self) -> Option<&dyn Listable> {
        self.inner.as_listable()
    }

    fn as_walkable(&self) -> Option<&dyn Walkable> {
        self.inner.as_walkable()
    }
}
