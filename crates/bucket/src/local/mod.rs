//! Bucket rooted at a directory of the local filesystem.

mod bucket;
mod list;
mod manager;
mod walk;

pub use bucket::LocalBucket;
pub use list::LocalListIterator;
pub use manager::LocalBucketManager;
