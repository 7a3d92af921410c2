//! Native tree walk for the local backend.
//!
//! Directories are read whole and visited in lexical order, parent before
//! children. Entries are described without following symlinks, so a link
//! to a directory is reported and never descended into.

use std::collections::VecDeque;

use tokio::fs;
use tracing::trace;

use crate::bucket::{Visitor, WalkSignal};
use crate::error::{BucketError, Result};
use crate::item::Item;

use super::bucket::LocalBucket;

async fn read_level(bucket: &LocalBucket, key: &str) -> Result<VecDeque<Item>> {
    let sep = bucket.separator();
    let mut entries = fs::read_dir(bucket.real_path(key))
        .await
        .map_err(|err| BucketError::from_io(err, key))?;
    let mut children = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| BucketError::from_io(err, key))?
    {
        let child = entry.file_name().to_string_lossy().into_owned();
        let meta = entry
            .metadata()
            .await
            .map_err(|err| BucketError::from_io(err, &child))?;
        let child_key = if sep.is_root(key) {
            child
        } else {
            sep.join(&[key, child.as_str()])
        };
        children.push((child_key, meta));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children
        .iter()
        .map(|(child_key, meta)| bucket.item_from_metadata(child_key, meta))
        .collect())
}

pub(super) async fn walk_tree(bucket: &LocalBucket, dir: &str, visitor: &mut Visitor<'_>) -> Result<()> {
    let key = bucket.key(dir);
    let meta = match fs::metadata(bucket.real_path(&key)).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(BucketError::from_io(err, dir)),
    };
    if !meta.is_dir() {
        visitor(Ok(&bucket.item_from_metadata(&key, &meta)));
        return Ok(());
    }

    let mut stack = vec![read_level(bucket, &key).await?];
    while let Some(level) = stack.last_mut() {
        let Some(item) = level.pop_front() else {
            stack.pop();
            continue;
        };
        match visitor(Ok(&item)) {
            WalkSignal::Stop => {
                trace!(name = %item.name(), "walk stopped by visitor");
                return Ok(());
            }
            WalkSignal::SkipSubtree => continue,
            WalkSignal::Continue => {}
        }
        if item.is_dir() {
            let child_key = bucket.key(item.name());
            match read_level(bucket, &child_key).await {
                Ok(children) => stack.push(children),
                Err(err) => {
                    if visitor(Err(err)) == WalkSignal::Stop {
                        return Ok(());
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::bucket::{Bucket, Walkable};
    use crate::options::WriteOptions;

    #[tokio::test]
    async fn test_symlinked_directory_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        bucket
            .write("real/inner.txt", Bytes::from_static(b"x"), WriteOptions::default())
            .await
            .unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let mut names = Vec::new();
        bucket
            .walk("/", &mut |entry| {
                names.push(entry.unwrap().name().to_string());
                WalkSignal::Continue
            })
            .await
            .unwrap();

        let inner = bucket.separator().join(&["real", "inner.txt"]);
        assert_eq!(names.iter().filter(|n| **n == inner).count(), 1);
        assert!(!names.iter().any(|n| n.starts_with("link") && n.contains("inner")));
    }
}
