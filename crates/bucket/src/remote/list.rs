use std::collections::VecDeque;

use async_trait::async_trait;

use crate::bucket::ListIterator;
use crate::error::{BucketError, Result};
use crate::item::Item;

use super::bucket::RemoteBucket;
use super::keys::{dir_name, is_marker, Key};

/// One level of a delimited prefix listing.
///
/// Common prefixes become directory entries and objects become file
/// entries; directory markers are never reported. Entries are described
/// lazily: size and modification time come from the listing, the rest is
/// fetched on demand.
pub struct RemoteListIterator {
    queue: VecDeque<Item>,
}

impl RemoteListIterator {
    pub(super) async fn load(bucket: &RemoteBucket, name: &str) -> Result<Self> {
        let key = Key::parse(name)?;
        if !key.is_dir() {
            match bucket.head_file(&key).await {
                Ok(item) => {
                    return Ok(Self {
                        queue: VecDeque::from([item]),
                    })
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        let key = key.as_dir();
        let prefix = key.prefix();
        let listing = bucket
            .store()
            .list_with_delimiter(prefix.as_ref())
            .await
            .map_err(|err| BucketError::from_store(err, name))?;

        let mut marked = false;
        let mut items: Vec<Item> = listing
            .common_prefixes
            .iter()
            .map(|prefix| bucket.listed_dir(dir_name(prefix)))
            .collect();
        for meta in &listing.objects {
            if is_marker(&meta.location) {
                marked = true;
                continue;
            }
            items.push(bucket.listed_file(meta));
        }

        if items.is_empty() && !marked && !key.is_root() {
            return Err(BucketError::not_found(name));
        }
        items.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(Self {
            queue: items.into(),
        })
    }
}

#[async_trait]
impl ListIterator for RemoteListIterator {
    async fn next(&mut self) -> Result<Option<Item>> {
        Ok(self.queue.pop_front())
    }

    async fn close(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use object_store::memory::InMemory;

    use super::*;
    use crate::bucket::{collect_items, Bucket, Listable};
    use crate::options::WriteOptions;

    async fn names(bucket: &RemoteBucket, name: &str) -> Result<Vec<(String, bool)>> {
        let items = collect_items(bucket.items(name).await?).await?;
        Ok(items
            .iter()
            .map(|item| (item.name().to_string(), item.is_dir()))
            .collect())
    }

    #[tokio::test]
    async fn test_levels_hide_markers() {
        let bucket = RemoteBucket::new("test", Arc::new(InMemory::new()));
        bucket
            .mkdir_all("docs/empty/", WriteOptions::default())
            .await
            .unwrap();
        for name in ["docs/a.txt", "docs/deep/b.txt", "top.txt"] {
            bucket
                .write(name, Bytes::from_static(b"x"), WriteOptions::default())
                .await
                .unwrap();
        }

        assert_eq!(
            names(&bucket, "docs").await.unwrap(),
            vec![
                ("docs/a.txt".to_string(), false),
                ("docs/deep/".to_string(), true),
                ("docs/empty/".to_string(), true),
            ]
        );
        assert_eq!(
            names(&bucket, "/").await.unwrap(),
            vec![("docs/".to_string(), true), ("top.txt".to_string(), false)]
        );
        assert!(names(&bucket, "docs/empty/").await.unwrap().is_empty());
        assert_eq!(
            names(&bucket, "top.txt").await.unwrap(),
            vec![("top.txt".to_string(), false)]
        );
        assert!(names(&bucket, "nope/").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_listed_items_materialize_on_demand() {
        let bucket = RemoteBucket::new("test", Arc::new(InMemory::new()));
        bucket
            .write("a.txt", Bytes::from_static(b"abc"), WriteOptions::default())
            .await
            .unwrap();

        let items = collect_items(bucket.items("").await.unwrap()).await.unwrap();
        let item = &items[0];
        assert_eq!(item.size(), 3);
        assert!(!item.is_materialized());
        assert!(item.etag().await.unwrap().is_some());
        assert!(item.is_materialized());
    }
}
