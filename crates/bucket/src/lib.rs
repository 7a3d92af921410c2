//! One hierarchical bucket API over local filesystems and flat object stores.
//!
//! A [`Bucket`] exposes the same read/write/stat/list/walk/copy/rename/remove
//! semantics whether it sits on a directory tree or on an eventually
//! consistent object store where directories are only key prefixes.
//!
//! # Features
//!
//! - Separator-aware path algebra that keeps every name inside the bucket root
//! - Lazily materialized [`Item`] metadata, fetched at most once per item
//! - Depth-first walks with skip-subtree and stop signals
//! - Recursive copy over a bounded worker pool that cancels on first failure
//! - Local filesystem, S3 (and compatible) and in-memory backends
//!
//! # Object store layout
//!
//! Object keys are bucket names stored verbatim, with no percent-encoding.
//! An explicit directory is an empty leaf object named `<dir>/.dirmarker`
//! ([`remote::DIR_MARKER`]) rather than a key ending in `/`, since object
//! store paths cannot end with the delimiter. Markers are hidden from
//! listings. A `<dir>/` object written by another S3 tool is not read as a
//! marker, but its directory still shows up as an implicit one through the
//! key prefix.
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use unibucket::{Bucket, Config, WalkSignal, WriteOptions};
//!
//! # async fn example() -> Result<(), unibucket::BucketError> {
//! let opened = Config::local("/tmp/bucket").open()?;
//! let bucket = opened.bucket;
//!
//! bucket
//!     .write("docs/readme.txt", Bytes::from_static(b"hello"), WriteOptions::default())
//!     .await?;
//! bucket.copy_all2("docs/", "backup/docs/", Default::default()).await?;
//!
//! if let Some(walker) = bucket.as_walkable() {
//!     walker
//!         .walk("backup/", &mut |entry| {
//!             if let Ok(item) = entry {
//!                 println!("{}", item.name());
//!             }
//!             WalkSignal::Continue
//!         })
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod bucket;
mod config;
mod copy;
mod error;
mod item;
mod options;
mod path;
mod walk;

pub mod local;
pub mod remote;

pub use bucket::{
    collect_items, BoxReader, BoxWriter, Bucket, BucketManager, ListIterator, Listable, Visitor,
    WalkSignal, Walkable,
};
pub use config::{BackendConfig, Config, OpenedBucket, S3Config};
pub use copy::copy_all;
pub use error::{BucketError, RenamePhase, Result};
pub use item::{Item, ItemInfo, ItemSys};
pub use options::{
    CopyConfig, CopyOptions, Metadata, WriteOptions, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE,
};
pub use path::Separator;
pub use walk::walk_listing;
