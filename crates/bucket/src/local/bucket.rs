use std::fs::Metadata as FsMetadata;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::bucket::{BoxReader, BoxWriter, Bucket, ListIterator, Listable, Visitor, Walkable};
use crate::copy;
use crate::error::{BucketError, Result};
use crate::item::{Item, ItemInfo, ItemSys};
use crate::options::{CopyConfig, CopyOptions, Metadata, WriteOptions, DEFAULT_FILE_MODE};
use crate::path::Separator;

use super::list::LocalListIterator;

/// Bucket over a directory tree. Names are resolved against the root after
/// sanitizing, so no name can reach outside it.
#[derive(Debug)]
pub struct LocalBucket {
    me: Weak<LocalBucket>,
    root: PathBuf,
    name: String,
    sep: Separator,
    copy: CopyConfig,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>) -> Arc<Self> {
        Self::with_copy_config(root, CopyConfig::default())
    }

    pub fn with_copy_config(root: impl Into<PathBuf>, copy: CopyConfig) -> Arc<Self> {
        let root = root.into();
        let name = root.to_string_lossy().into_owned();
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            root,
            name,
            sep: Separator::native(),
            copy,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(super) fn weak(&self) -> Weak<dyn Bucket> {
        self.me.clone()
    }

    fn arc(&self) -> Result<Arc<LocalBucket>> {
        self.me
            .upgrade()
            .ok_or_else(|| BucketError::BucketGone(self.name.clone()))
    }

    pub(super) fn separator(&self) -> Separator {
        self.sep
    }

    /// Key relative to the root; the root itself is the separator.
    pub(super) fn key(&self, name: &str) -> String {
        self.sep.sanitize(name)
    }

    pub(super) fn real_path(&self, key: &str) -> PathBuf {
        if self.sep.is_root(key) {
            self.root.clone()
        } else {
            self.root.join(key)
        }
    }

    /// Canonical item name for `key`: directories carry a trailing
    /// separator and the root is the separator alone.
    pub(super) fn item_name(&self, key: &str, dir: bool) -> String {
        if self.sep.is_root(key) {
            self.sep.to_string()
        } else if dir {
            self.sep.directorize(key)
        } else {
            key.to_string()
        }
    }

    pub(super) fn item_from_metadata(&self, key: &str, meta: &FsMetadata) -> Item {
        let dir = meta.is_dir();
        Item::new(self.weak(), self.item_name(key, dir), dir).with_info(info_from_metadata(meta))
    }

    async fn stat_key(&self, key: &str, name: &str) -> Result<Item> {
        let meta = fs::metadata(self.real_path(key))
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        Ok(self.item_from_metadata(key, &meta))
    }

    async fn open_writer(&self, key: &str, name: &str, opts: &WriteOptions) -> Result<BoxWriter> {
        let mut options = fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(opts.file_mode());
        let file = options
            .open(self.real_path(key))
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        Ok(match opts.buffer_size {
            Some(capacity) => Box::new(BufWriter::with_capacity(capacity, file)),
            None => Box::new(file),
        })
    }

    async fn ensure_parent(&self, key: &str) -> Result<()> {
        let parent = self.sep.dir(key);
        if parent == "." || self.sep.is_root(&parent) {
            return Ok(());
        }
        self.mkdir_all(&parent, WriteOptions::default()).await
    }
}

fn info_from_metadata(meta: &FsMetadata) -> ItemInfo {
    let mod_time = meta.modified().ok().map(DateTime::<Utc>::from);
    let etag = mod_time.map(|t| {
        format!(
            "W/\"{:x}-{:x}\"",
            t.timestamp_nanos_opt().unwrap_or_default(),
            meta.len()
        )
    });
    ItemInfo {
        size: meta.len(),
        mod_time,
        mode: mode_of(meta),
        etag: if meta.is_dir() { None } else { etag },
        metadata: Metadata::new(),
        sys: Some(ItemSys::Local {
            inode: inode_of(meta),
            readonly: meta.permissions().readonly(),
        }),
    }
}

#[cfg(unix)]
fn mode_of(meta: &FsMetadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(meta: &FsMetadata) -> u32 {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, _) => crate::options::DEFAULT_DIR_MODE,
        (false, true) => 0o444,
        (false, false) => DEFAULT_FILE_MODE,
    }
}

#[cfg(unix)]
fn inode_of(meta: &FsMetadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn inode_of(_meta: &FsMetadata) -> u64 {
    0
}

#[cfg(unix)]
fn permissions(mode: u32) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    std::fs::Permissions::from_mode(mode)
}

#[async_trait]
impl Bucket for LocalBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn path_separator(&self) -> Separator {
        self.sep
    }

    async fn read(&self, name: &str) -> Result<Bytes> {
        let mut reader = self.new_reader(name).await?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        Ok(Bytes::from(buf))
    }

    async fn new_reader(&self, name: &str) -> Result<BoxReader> {
        let key = self.key(name);
        let item = self.stat_key(&key, name).await?;
        if item.is_dir() {
            return Err(BucketError::IsADirectory {
                path: name.to_string(),
            });
        }
        let file = fs::File::open(self.real_path(&key))
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        Ok(Box::new(file))
    }

    async fn write(&self, name: &str, data: Bytes, opts: WriteOptions) -> Result<usize> {
        let key = self.key(name);
        if self.sep.is_root(&key) {
            return Err(BucketError::IsADirectory {
                path: name.to_string(),
            });
        }
        self.ensure_parent(&key).await?;

        let mut writer = self.open_writer(&key, name, &opts).await?;
        writer
            .write_all(&data)
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        writer
            .shutdown()
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        debug!(key = %key, size = data.len(), "wrote local file");
        Ok(data.len())
    }

    async fn new_writer(&self, name: &str, opts: WriteOptions) -> Result<BoxWriter> {
        let key = self.key(name);
        if self.sep.is_root(&key) {
            return Err(BucketError::IsADirectory {
                path: name.to_string(),
            });
        }
        self.ensure_parent(&key).await?;
        self.open_writer(&key, name, &opts).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let key = self.key(name);
        if self.sep.is_root(&key) {
            return Err(BucketError::InvalidPath(format!(
                "{name}: cannot remove the bucket root"
            )));
        }
        let path = self.real_path(&key);
        let meta = fs::symlink_metadata(&path)
            .await
            .map_err(|err| BucketError::from_io(err, name))?;
        let removed = if meta.is_dir() {
            fs::remove_dir(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|err| BucketError::from_io(err, name))?;
        debug!(key = %key, "removed local entry");
        Ok(())
    }

    async fn remove_all(&self, name: &str) -> Result<()> {
        let key = self.key(name);
        if self.sep.is_root(&key) {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(err) => return Err(BucketError::from_io(err, name)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let child = entry.file_name().to_string_lossy().into_owned();
                self.remove_all(&child).await?;
            }
            return Ok(());
        }

        let path = self.real_path(&key);
        let meta = match fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(BucketError::from_io(err, name)),
        };
        let removed = if meta.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|err| BucketError::from_io(err, name))?;
        debug!(key = %key, "removed local tree");
        Ok(())
    }

    async fn stat(&self, name: &str) -> Result<Item> {
        let key = self.key(name);
        self.stat_key(&key, name).await
    }

    async fn mkdir(&self, name: &str, opts: WriteOptions) -> Result<()> {
        let key = self.key(name);
        match self.stat_key(&key, name).await {
            Ok(item) if item.is_dir() => return self.chmod(name, opts.dir_mode()).await,
            Ok(_) => {
                return Err(BucketError::NotADirectory {
                    path: name.to_string(),
                })
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        builder.mode(opts.dir_mode());
        builder
            .create(self.real_path(&key))
            .await
            .map_err(|err| BucketError::from_io(err, name))
    }

    async fn mkdir_all(&self, name: &str, opts: WriteOptions) -> Result<()> {
        let key = self.key(name);
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(opts.dir_mode());
        builder
            .create(self.real_path(&key))
            .await
            .map_err(|err| BucketError::from_io(err, name))
    }

    #[cfg(unix)]
    async fn chmod(&self, name: &str, mode: u32) -> Result<()> {
        let key = self.key(name);
        fs::set_permissions(self.real_path(&key), permissions(mode))
            .await
            .map_err(|err| BucketError::from_io(err, name))
    }

    #[cfg(not(unix))]
    async fn chmod(&self, name: &str, mode: u32) -> Result<()> {
        let key = self.key(name);
        let path = self.real_path(&key);
        let mut perms = fs::metadata(&path)
            .await
            .map_err(|err| BucketError::from_io(err, name))?
            .permissions();
        perms.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(&path, perms)
            .await
            .map_err(|err| BucketError::from_io(err, name))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from_key = self.key(from);
        let to_key = self.key(to);
        if self.sep.is_root(&from_key) || self.sep.is_root(&to_key) {
            return Err(BucketError::InvalidPath(format!(
                "{from} -> {to}: cannot rename the bucket root"
            )));
        }
        if from_key == to_key {
            self.stat_key(&from_key, from).await?;
            return Ok(());
        }
        if self.sep.is_within(&from_key, &to_key) {
            return Err(BucketError::InvalidPath(format!(
                "{from} -> {to}: cannot move an entry below itself"
            )));
        }
        self.ensure_parent(&to_key).await?;
        fs::rename(self.real_path(&from_key), self.real_path(&to_key))
            .await
            .map_err(|err| BucketError::from_io(err, from))?;
        debug!(from = %from_key, to = %to_key, "renamed local entry");
        Ok(())
    }

    async fn copy(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()> {
        if from.is_dir() {
            let mode = opts.mode.unwrap_or(from.mode());
            let dir_opts = if mode == 0 {
                WriteOptions::default()
            } else {
                WriteOptions::default().with_mode(mode)
            };
            return self.mkdir_all(to, dir_opts).await;
        }

        let key = self.key(to);
        self.ensure_parent(&key).await?;

        let mut source = from.open().await?;
        let mode = match opts.mode.unwrap_or(from.mode()) {
            0 => DEFAULT_FILE_MODE,
            mode => mode,
        };
        let mut dest = self
            .open_writer(&key, to, &WriteOptions::default().with_mode(mode))
            .await?;
        let copied = tokio::io::copy(&mut source, &mut dest)
            .await
            .map_err(|err| BucketError::from_io(err, to))?;
        dest.shutdown()
            .await
            .map_err(|err| BucketError::from_io(err, to))?;
        debug!(from = %from.name(), to = %key, size = copied, "copied into local bucket");
        Ok(())
    }

    async fn copy_all(&self, from: &Item, to: &str, opts: CopyOptions) -> Result<()> {
        let key = self.key(to);
        self.ensure_parent(&key).await?;
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
impl Listable for LocalBucket {
    async fn items(&self, name: &str) -> Result<Box<dyn ListIterator>> {
        Ok(Box::new(LocalListIterator::new(self.arc()?, name)))
    }
}

#[async_trait]
impl Walkable for LocalBucket {
    async fn walk(&self, dir: &str, visitor: &mut Visitor<'_>) -> Result<()> {
        super::walk::walk_tree(self, dir, visitor).await
    }
}
