//! Integration tests for the recursive copy engine
//!
//! These tests drive `copy_all` directly with a destination that fails on
//! chosen entries, to check error propagation and cancellation.

mod common;

use std::sync::Arc;

use bytes::Bytes;

use unibucket::{copy_all, Bucket, BucketError, CopyOptions, WriteOptions};

use common::{create_deep_dir, local_fixture, remote_fixture, FailingBucket};

#[tokio::test]
async fn test_copy_all_returns_first_error() {
    let source = local_fixture();
    source.manager.create().await.unwrap();
    create_deep_dir(source.bucket.as_ref(), "src/").await.unwrap();

    let dest = remote_fixture();
    let failing = FailingBucket::new(dest.bucket.clone(), "foo31.txt");
    let root = source.bucket.stat("src/").await.unwrap();

    let err = copy_all(failing.clone(), &root, "dst/", CopyOptions::default(), 4)
        .await
        .unwrap_err();
    match err {
        BucketError::Io(io) => assert!(io.to_string().contains("foo31.txt"), "{io}"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!dest.bucket.exists("dst/test1/test2/test3/foo31.txt").await.unwrap());
}

#[tokio::test]
async fn test_copy_all_cancels_pending_entries() {
    let source = remote_fixture();
    create_deep_dir(source.bucket.as_ref(), "src/").await.unwrap();

    let dest = remote_fixture();
    // The first entry queued after the root is `test1/`.
    let failing = FailingBucket::new(dest.bucket.clone(), "dst/test1");
    let root = source.bucket.stat("src/").await.unwrap();

    let result = copy_all(failing.clone(), &root, "dst/", CopyOptions::default(), 1).await;
    assert!(result.is_err());

    // Only the root made it across; the single worker stopped at the
    // failure and nothing queued behind it ran.
    assert_eq!(failing.copies(), 1);
    assert!(dest.bucket.exists("dst/").await.unwrap());
    assert!(!dest.bucket.exists("dst/test1/foo1.txt").await.unwrap());
}

#[tokio::test]
async fn test_copy_all_succeeds_with_many_workers() {
    let source = remote_fixture();
    for i in 0..40 {
        source
            .bucket
            .write(
                &format!("many/file{i:02}.txt"),
                Bytes::from(format!("content {i}")),
                WriteOptions::default(),
            )
            .await
            .unwrap();
    }

    let dest = local_fixture();
    dest.manager.create().await.unwrap();
    let root = source.bucket.stat("many/").await.unwrap();
    copy_all(dest.bucket.clone(), &root, "copy/", CopyOptions::default(), 8)
        .await
        .unwrap();

    for i in [0, 17, 39] {
        let content = dest
            .bucket
            .read(&format!("copy/file{i:02}.txt"))
            .await
            .unwrap();
        assert_eq!(content, Bytes::from(format!("content {i}")));
    }
}

#[tokio::test]
async fn test_copy_all_rejects_item_of_dropped_bucket() {
    let dest = remote_fixture();
    let orphan = {
        let gone = remote_fixture();
        gone.bucket.mkdir("dir/", WriteOptions::default()).await.unwrap();
        gone.bucket.stat("dir/").await.unwrap()
    };

    let dest_bucket: Arc<dyn Bucket> = dest.bucket.clone();
    let err = copy_all(dest_bucket, &orphan, "dst/", CopyOptions::default(), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, BucketError::BucketGone(_)), "{err:?}");
}
