use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, GetResult, ObjectMeta, ObjectStore,
    PutOptions, PutPayload,
};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use crate::bucket::{
    not_supported, BoxReader, BoxWriter, Bucket, ListIterator, Listable, Visitor, Walkable,
};
use crate::copy;
use crate::error::{BucketError, RenamePhase, Result};
use crate::item::{Item, ItemInfo, ItemSys};
use crate::options::{
    CopyConfig, CopyOptions, Metadata, WriteOptions, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE,
};
use crate::path::Separator;
use crate::walk::walk_listing;

use super::keys::Key;
use super::list::RemoteListIterator;
use super::wait::{wait_until_exists, wait_until_gone, ConsistencyConfig};

const BACKEND: &str = "remote";

/// Buffer used by writers when the caller gives no size hint.
const DEFAULT_WRITE_BUFFER: usize = 10 * 1024 * 1024;

/// Bucket over a flat object store.
///
/// Directories exist either explicitly, through a marker object, or
/// implicitly, because some key lives below them. Mutations that remove or
/// create keys wait until the store reports the change before returning.
#[derive(Debug)]
pub struct RemoteBucket {
    me: Weak<RemoteBucket>,
    name: String,
    store: Arc<dyn ObjectStore>,
    consistency: ConsistencyConfig,
    copy: CopyConfig,
}

impl RemoteBucket {
    pub fn new(name: impl Into<String>, store: Arc<dyn ObjectStore>) -> Arc<Self> {
        Self::with_config(name, store, ConsistencyConfig::default(), CopyConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        consistency: ConsistencyConfig,
        copy: CopyConfig,
    ) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            name,
            store,
            consistency,
            copy,
        })
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub(super) fn weak(&self) -> Weak<dyn Bucket> {
        self.me.clone()
    }

    fn arc(&self) -> Result<Arc<RemoteBucket>> {
        self.me
            .upgrade()
            .ok_or_else(|| BucketError::BucketGone(self.name.clone()))
    }

    /// Lazily described file entry from a listing.
    pub(super) fn listed_file(&self, meta: &ObjectMeta) -> Item {
        Item::new(self.weak(), meta.location.as_ref(), false)
            .with_size(meta.size as u64)
            .with_mod_time(meta.last_modified)
            .with_mode(DEFAULT_FILE_MODE)
    }

    /// Lazily described directory entry from a listing.
    pub(super) fn listed_dir(&self, name: String) -> Item {
        Item::new(self.weak(), name, true).with_mode(DEFAULT_DIR_MODE)
    }

    /// Materialized file entry, or `NotFound`.
    pub(super) async fn head_file(&self, key: &Key) -> Result<Item> {
        let path = key.file_path()?;
        let info = self.head(&path, &key.name(), DEFAULT_FILE_MODE).await?;
        Ok(Item::new(self.weak(), key.name(), false).with_info(info))
    }

    /// Materialized directory entry, or `NotFound`. A directory exists when
    /// its marker does or when anything is stored below it.
    pub(super) async fn stat_dir(&self, key: &Key) -> Result<Item> {
        let key = key.as_dir();
        let name = key.name();
        let (Some(marker), Some(prefix)) = (key.marker_path(), key.prefix()) else {
            return Ok(Item::new(self.weak(), name, true).with_info(ItemInfo {
                mode: DEFAULT_DIR_MODE,
                ..ItemInfo::default()
            }));
        };

        match self.head(&marker, &name, DEFAULT_DIR_MODE).await {
            Ok(info) => return Ok(Item::new(self.weak(), name, true).with_info(info)),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        match self.store.list(Some(&prefix)).next().await {
            Some(Ok(_)) => Ok(Item::new(self.weak(), name, true).with_info(ItemInfo {
                mode: DEFAULT_DIR_MODE,
                ..ItemInfo::default()
            })),
            Some(Err(err)) => Err(BucketError::from_store(err, &name)),
            None => Err(BucketError::not_found(name)),
        }
    }

    async fn head(&self, path: &Path, name: &str, mode: u32) -> Result<ItemInfo> {
        let options = GetOptions {
            head: true,
            ..GetOptions::default()
        };
        let result = self
            .store
            .get_opts(path, options)
            .await
            .map_err(|err| BucketError::from_store(err, name))?;
        Ok(ItemInfo {
            size: result.meta.size as u64,
            mod_time: Some(result.meta.last_modified),
            mode,
            etag: result.meta.e_tag.clone(),
            metadata: metadata_from(&result.attributes),
            sys: Some(ItemSys::Remote {
                version: result.meta.version.clone(),
            }),
        })
    }

    async fn put_marker(&self, key: &Key, metadata: &Metadata) -> Result<()> {
        let Some(marker) = key.marker_path() else {
            return Ok(());
        };
        let options = PutOptions {
            attributes: attributes_from(metadata),
            ..PutOptions::default()
        };
        self.store
            .put_opts(&marker, PutPayload::from(Bytes::new()), options)
            .await
            .map_err(|err| BucketError::from_store(err, &key.name()))?;
        debug!(bucket = %self.name, marker = %marker, "created directory marker");
        Ok(())
    }

    /// Every object at or below `key`, markers included.
    async fn collect_tree(&self, key: &Key) -> Result<BTreeSet<Path>> {
        let mut paths = BTreeSet::new();
        if !key.is_dir() {
            if let Ok(path) = key.file_path() {
                match self.store.head(&path).await {
                    Ok(meta) => {
                        paths.insert(meta.location);
                    }
                    Err(object_store::Error::NotFound { .. }) => {}
                    Err(err) => return Err(BucketError::from_store(err, &key.name())),
                }
            }
        }

        let prefix = key.prefix();
        let mut listing = self.store.list(prefix.as_ref());
        while let Some(meta) = listing.next().await {
            let meta = meta.map_err(|err| BucketError::from_store(err, &key.name()))?;
            paths.insert(meta.location);
        }
        Ok(paths)
    }

    async fn delete_paths(&self, paths: BTreeSet<Path>) -> Result<usize> {
        let count = paths.len();
        let locations = stream::iter(paths.into_iter().map(Ok)).boxed();
        let mut deleted = self.store.delete_stream(locations);
        while let Some(result) = deleted.next().await {
            match result {
                Ok(_) | Err(object_store::Error::NotFound { .. }) => {}
                Err(err) => return Err(BucketError::Store(err)),
            }
        }
        Ok(count)
    }

    /// Fetch a file's content. Names that resolve to a directory fail with
    /// `IsADirectory`, names that resolve to nothing with `NotFound`.
    async fn get_file(&self, name: &str) -> Result<GetResult> {
        let key = Key::parse(name)?;
        let path = match key.file_path() {
            Ok(path) => path,
            Err(BucketError::IsADirectory { .. }) => return Err(self.missing_file(&key, name).await),
            Err(err) => return Err(err),
        };
        match self.store.get(&path).await {
            Ok(result) => Ok(result),
            Err(object_store::Error::NotFound { .. }) => Err(self.missing_file(&key, name).await),
            Err(err) => Err(BucketError::Store(err)),
        }
    }

    async fn missing_file(&self, key: &Key, name: &str) -> BucketError {
        match self.stat_dir(key).await {
            Ok(_) => BucketError::IsADirectory {
                path: name.to_string(),
            },
            Err(err) if err.is_not_found() => BucketError::not_found(name),
            Err(err) => err,
        }
    }

    fn writer(&self, path: Path, opts: &WriteOptions) -> BufWriter {
        let capacity = opts.buffer_size.unwrap_or(DEFAULT_WRITE_BUFFER);
        let writer = BufWriter::with_capacity(self.store.clone(), path, capacity);
        if opts.metadata.is_empty() {
            writer
        } else {
            writer.with_attributes(attributes_from(&opts.metadata))
        }
    }
}

fn metadata_from(attributes: &Attributes) -> Metadata {
    attributes
        .iter()
        .filter_map(|(attribute, value)| match attribute {
            Attribute::Metadata(key) => Some((key.to_string(), value.as_ref().to_string())),
            _ => None,
        })
        .collect()
}

fn attributes_from(metadata: &Metadata) -> Attributes {
    let mut attributes = Attributes::new();
    for (key, value) in metadata {
        attributes.insert(
            Attribute::Metadata(key.clone().into()),
            AttributeValue::from(value.clone()),
        );
    }
    attributes
}

#[async_trait]
impl Bucket for RemoteBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn path_separator(&self) -> Separator {
        Separator::SLASH
    }

    async fn read(&self, name: &str) -> Result<Bytes> {
        self.get_file(name)
            .await?
            .bytes()
            .await
            .map_err(|err| BucketError::from_store(err, name))
    }

    async fn new_reader(&self, name: &str) -> Result<BoxReader> {
        let stream = self
            .get_file(name)
            .await?
            .into_stream()
            .map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(stream)))
    }

    async fn write(&self, name: &str, data: Bytes, opts: WriteOptions) -> Result<usize> {
        let key = Key::parse(name)?;
        let path = key.file_path()?;
        let size = data.len();
        let options = PutOptions {
            attributes: attributes_from(&opts.metadata),
            ..PutOptions::default()
        };
        self.store
            .put_opts(&path, PutPayload::from(data), options)
            .await
            .map_err(|err| BucketError::from_store(err, name))?;
        debug!(bucket = %self.name, key = %path, size, "wrote object");
        Ok(size)
    }

    async fn new_writer(&self, name: &str, opts: WriteOptions) -> Result<BoxWriter> {
        let path = Key::parse(name)?.file_path()?;
        Ok(Box::new(self.writer(path, &opts)))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let item = self.stat(name).await?;
        let key = Key::parse(item.name())?;
        if key.is_root() {
            return Err(BucketError::InvalidPath(format!(
                "{name}: cannot remove the bucket root"
            )));
        }

        let target = if item.is_dir() {
            let Some(marker) = key.marker_path() else {
                return Ok(());
            };
            let mut children = self.store.list(key.prefix().as_ref());
            while let Some(meta) = children.next().await {
                let meta = meta.map_err(|err| BucketError::from_store(err, name))?;
                if meta.location != marker {
                    return Err(BucketError::DirectoryNotEmpty {
                        path: item.name().to_string(),
                    });
                }
            }
            marker
        } else {
            key.file_path()?
        };

        match self.store.delete(&target).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
            Err(err) => return Err(BucketError::from_store(err, name)),
        }
        debug!(bucket = %self.name, key = %target, "removed object");
        wait_until_gone(self.store.as_ref(), &target, &self.consistency).await
    }

    async fn remove_all(&self, name: &str) -> Result<()> {
        let key = Key::parse(name)?;
        let paths = self.collect_tree(&key).await?;
        let marker = key.marker_path();
        let removed = self.delete_paths(paths).await?;
        debug!(bucket = %self.name, name = %name, removed, "removed object tree");

        if key.is_root() {
            return Ok(());
        }
        if !key.is_dir() {
            if let Ok(path) = key.file_path() {
                wait_until_gone(self.store.as_ref(), &path, &self.consistency).await?;
            }
        }
        match marker {
            Some(marker) => wait_until_gone(self.store.as_ref(), &marker, &self.consistency).await,
            None => Ok(()),
        }
    }

    async fn stat(&self, name: &str) -> Result<Item> {
        let key = Key::parse(name)?;
        if !key.is_dir() {
            match self.head_file(&key).await {
                Ok(item) => return Ok(item),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        self.stat_dir(&key).await.map_err(|err| match err {
            BucketError::NotFound { .. } => BucketError::not_found(name),
            other => other,
        })
    }

    async fn mkdir(&self, name: &str, opts: WriteOptions) -> Result<()> {
        self.put_marker(&Key::parse(name)?.as_dir(), &opts.metadata)
            .await
    }

    async fn mkdir_all(&self, name: &str, opts: WriteOptions) -> Result<()> {
        for key in Key::parse(name)?.ancestry() {
            self.put_marker(&key, &opts.metadata).await?;
        }
        Ok(())
    }

    async fn chmod(&self, _name: &str, _mode: u32) -> Result<()> {
        Err(not_supported("chmod", BACKEND))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let wrap = |phase: RenamePhase| {
            move |source: BucketError| BucketError::Rename {
                from: from.to_string(),
                to: to.to_string(),
                phase,
                source: Box::new(source),
            }
        };
        let from_key = Key::parse(from)?;
        let to_key = Key::parse(to)?;
        if from_key.is_root() || to_key.is_root() {
            return Err(BucketError::InvalidPath(format!(
                "{from} -> {to}: cannot rename the bucket root"
            )));
        }
        if from_key.as_dir() == to_key.as_dir() {
            self.stat(from).await.map_err(wrap(RenamePhase::Copy))?;
            return Ok(());
        }
        if from_key.contains(&to_key) {
            return Err(BucketError::InvalidPath(format!(
                "{from} -> {to}: cannot move an entry below itself"
            )));
        }

        self.copy_all2(from, to, CopyOptions::default())
            .await
            .map_err(wrap(RenamePhase::Copy))?;
        self.remove_all(from)
            .await
            .map_err(wrap(RenamePhase::Remove))?;
        info!(bucket = %self.name, from = %from, to = %to, "renamed");
        Ok(())
    }

    async fn copy(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()> {
        if from.is_dir() {
            let metadata = opts.metadata.unwrap_or_default();
            let key = Key::parse(to)?.as_dir();
            self.put_marker(&key, &metadata).await?;
            return match key.marker_path() {
                Some(marker) => {
                    wait_until_exists(self.store.as_ref(), &marker, &self.consistency).await
                }
                None => Ok(()),
            };
        }

        let dest = Key::parse(to)?.file_path()?;
        if from.belongs_to(self) && opts.metadata.is_none() {
            let source = Key::parse(from.name())?.file_path()?;
            self.store
                .copy(&source, &dest)
                .await
                .map_err(|err| BucketError::from_store(err, from.name()))?;
            debug!(bucket = %self.name, from = %source, to = %dest, "server-side copy");
        } else {
            let metadata = match opts.metadata {
                Some(metadata) => metadata,
                None => from.metadata().await?.clone(),
            };
            let mut reader = from.open().await?;
            let mut writer = self.writer(dest.clone(), &WriteOptions::default().with_metadata(metadata));
            let copied = tokio::io::copy(&mut reader, &mut writer)
                .await
                .map_err(|err| BucketError::from_io(err, to))?;
            writer
                .shutdown()
                .await
                .map_err(|err| BucketError::from_io(err, to))?;
            debug!(bucket = %self.name, from = %from.name(), to = %dest, size = copied, "streamed copy");
        }
        wait_until_exists(self.store.as_ref(), &dest, &self.consistency).await
    }

    async fn copy_all(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()> {
        copy::copy_all(self.arc()?, from, to, opts, self.copy.workers()).await
    }

    fn as_listable(&self) -> Option<&dyn Listable> {
        Some(self)
    }

    fn as_walkable(&self) -> Option<&dyn Walkable> {
        Some(self)
    }
}

#[async_trait]
impl Listable for RemoteBucket {
    /// The listing request is issued here, so a missing directory fails
    /// before any entry is produced.
    async fn items(&self, name: &str) -> Result<Box<dyn ListIterator>> {
        Ok(Box::new(RemoteListIterator::load(self, name).await?))
    }
}

#[async_trait]
impl Walkable for RemoteBucket {
    async fn walk(&self, dir: &str, visitor: &mut Visitor<'_>) -> Result<()> {
        walk_listing(self, dir, visitor).await
    }
}
