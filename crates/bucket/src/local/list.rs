use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use crate::bucket::ListIterator;
use crate::error::{BucketError, Result};
use crate::item::Item;

use super::bucket::LocalBucket;

/// One directory level, read in the order the filesystem returns it.
///
/// Nothing is read until the first `next`: that call resolves the name and
/// either yields the file it names or loads the directory's children.
pub struct LocalListIterator {
    bucket: Arc<LocalBucket>,
    name: String,
    key: String,
    queue: Option<VecDeque<Item>>,
}

impl LocalListIterator {
    pub(super) fn new(bucket: Arc<LocalBucket>, name: &str) -> Self {
        let key = bucket.key(name);
        Self {
            bucket,
            name: name.to_string(),
            key,
            queue: None,
        }
    }

    async fn load(&self) -> Result<VecDeque<Item>> {
        let path = self.bucket.real_path(&self.key);
        let meta = fs::metadata(&path)
            .await
            .map_err(|err| BucketError::from_io(err, &self.name))?;
        if !meta.is_dir() {
            return Ok(VecDeque::from([self.bucket.item_from_metadata(&self.key, &meta)]));
        }

        let sep = self.bucket.separator();
        let mut entries = fs::read_dir(&path)
            .await
            .map_err(|err| BucketError::from_io(err, &self.name))?;
        let mut queue = VecDeque::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| BucketError::from_io(err, &self.name))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|err| BucketError::from_io(err, &self.name))?;
            let child = entry.file_name().to_string_lossy().into_owned();
            let key = if sep.is_root(&self.key) {
                child
            } else {
                sep.join(&[self.key.as_str(), child.as_str()])
            };
            queue.push_back(self.bucket.item_from_metadata(&key, &meta));
        }
        Ok(queue)
    }
}

#[async_trait]
impl ListIterator for LocalListIterator {
    async fn next(&mut self) -> Result<Option<Item>> {
        if self.queue.is_none() {
            self.queue = Some(self.load().await?);
        }
        Ok(self.queue.as_mut().and_then(VecDeque::pop_front))
    }

    async fn close(&mut self) {
        self.queue = Some(VecDeque::new());
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::bucket::{collect_items, Bucket, Listable};
    use crate::options::WriteOptions;

    #[tokio::test]
    async fn test_lists_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        for name in ["d/a.txt", "d/sub/b.txt", "top.txt"] {
            bucket
                .write(name, Bytes::from_static(b"x"), WriteOptions::default())
                .await
                .unwrap();
        }

        let iter = bucket.items("d").await.unwrap();
        let mut names: Vec<String> = collect_items(iter)
            .await
            .unwrap()
            .iter()
            .map(|item| item.name().to_string())
            .collect();
        names.sort();
        let sep = bucket.separator();
        assert_eq!(names, vec![sep.join(&["d", "a.txt"]), sep.directorize(&sep.join(&["d", "sub"]))]);
    }

    #[tokio::test]
    async fn test_file_yields_itself_once() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        bucket
            .write("f.txt", Bytes::from_static(b"x"), WriteOptions::default())
            .await
            .unwrap();

        let items = collect_items(bucket.items("f.txt").await.unwrap()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "f.txt");
        assert!(!items[0].is_dir());
    }

    #[tokio::test]
    async fn test_missing_directory_fails_on_first_next() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        let mut iter = bucket.items("missing").await.unwrap();
        assert!(iter.next().await.unwrap_err().is_not_found());
        iter.close().await;
    }
}
