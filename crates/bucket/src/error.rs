//! Error taxonomy shared by every bucket backend.
//!
//! Backends classify their native failures into the variants below so that
//! callers see the same error for the same condition regardless of whether
//! the bucket sits on a local filesystem or on an object store.

use std::fmt;
use std::io;

/// Which half of a two-step rename failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenamePhase {
    /// Copying the source tree to the destination.
    Copy,
    /// Removing the source tree after a successful copy.
    Remove,
}

impl fmt::Display for RenamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenamePhase::Copy => write!(f, "copy"),
            RenamePhase::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    #[error("{path}: no such file or directory")]
    NotFound { path: String },

    #[error("{path}: not a directory")]
    NotADirectory { path: String },

    #[error("{path}: is a directory")]
    IsADirectory { path: String },

    #[error("{path}: directory not empty")]
    DirectoryNotEmpty { path: String },

    #[error("{op} is not supported by {backend} buckets")]
    NotSupported {
        op: &'static str,
        backend: &'static str,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Rename on a flat backend is copy-then-remove; a failure leaves both
    /// trees in place and reports the step that broke.
    #[error("rename {from} -> {to} failed during {phase}: {source}")]
    Rename {
        from: String,
        to: String,
        phase: RenamePhase,
        #[source]
        source: Box<BucketError>,
    },

    #[error("{path}: not consistent after {attempts} checks")]
    ConsistencyTimeout { path: String, attempts: u32 },

    #[error("bucket {0} is no longer available")]
    BucketGone(String),

    #[error("copy task failed: {0}")]
    Task(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),
}

pub type Result<T> = std::result::Result<T, BucketError>;

impl BucketError {
    pub fn not_found(path: impl Into<String>) -> Self {
        BucketError::NotFound { path: path.into() }
    }

    /// True for the "path does not exist" class, whichever backend raised it.
    pub fn is_not_found(&self) -> bool {
        match self {
            BucketError::NotFound { .. } => true,
            BucketError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            BucketError::Store(object_store::Error::NotFound { .. }) => true,
            _ => false,
        }
    }

    /// Classify a filesystem error raised while operating on `path`.
    pub(crate) fn from_io(err: io::Error, path: &str) -> Self {
        let path = path.to_string();
        match err.kind() {
            io::ErrorKind::NotFound => BucketError::NotFound { path },
            io::ErrorKind::NotADirectory => BucketError::NotADirectory { path },
            io::ErrorKind::IsADirectory => BucketError::IsADirectory { path },
            io::ErrorKind::DirectoryNotEmpty => BucketError::DirectoryNotEmpty { path },
            _ => BucketError::Io(err),
        }
    }

    /// Classify an object store error raised while operating on `path`.
    pub(crate) fn from_store(err: object_store::Error, path: &str) -> Self {
        match err {
            object_store::Error::NotFound { .. } => BucketError::NotFound {
                path: path.to_string(),
            },
            other => BucketError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_is_classified() {
        let err = BucketError::from_io(io::Error::from(io::ErrorKind::NotFound), "a/b");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "a/b: no such file or directory");
    }

    #[test]
    fn test_store_not_found_is_classified() {
        let source = object_store::Error::NotFound {
            path: "a/b".to_string(),
            source: "missing".into(),
        };
        let err = BucketError::from_store(source, "a/b");
        assert!(matches!(err, BucketError::NotFound { ref path } if path == "a/b"));
    }

    #[test]
    fn test_rename_reports_phase() {
        let err = BucketError::Rename {
            from: "a/".to_string(),
            to: "b/".to_string(),
            phase: RenamePhase::Remove,
            source: Box::new(BucketError::not_found("a/x")),
        };
        assert_eq!(
            err.to_string(),
            "rename a/ -> b/ failed during remove: a/x: no such file or directory"
        );
        assert!(!err.is_not_found());
    }
}
