//! Bucket over a flat, eventually consistent object store.

mod bucket;
mod keys;
mod list;
mod manager;
mod store;
mod wait;

pub use bucket::RemoteBucket;
pub use keys::DIR_MARKER;
pub use list::RemoteListIterator;
pub use manager::RemoteBucketManager;
pub use store::{memory_store, s3_store};
pub use wait::ConsistencyConfig;
