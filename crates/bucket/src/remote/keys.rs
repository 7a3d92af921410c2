//! Mapping between bucket names and object store paths.
//!
//! Object store paths cannot end with a separator, so a directory marker is
//! stored as a reserved leaf inside the directory it marks: the directory
//! `a/b/` is marked by the object `a/b/.dirmarker`. Listings hide that leaf
//! and report the directory under its separator-terminated name.

use object_store::path::Path;

use crate::error::{BucketError, Result};
use crate::path::Separator;

/// Leaf name reserved for directory markers.
pub const DIR_MARKER: &str = ".dirmarker";

const SEP: Separator = Separator::SLASH;

/// A sanitized bucket name, either a file key or a directory key.
///
/// Names map to object paths verbatim: characters such as `#` or `%` are
/// stored as written, so a name reported by a listing resolves back to the
/// same object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Key {
    /// Sanitized key without any trailing separator; empty for the root.
    path: String,
    location: Path,
    dir: bool,
}

impl Key {
    pub(crate) fn parse(name: &str) -> Result<Self> {
        let sanitized = SEP.sanitize(name);
        if SEP.is_root(&sanitized) {
            return Ok(Self {
                path: String::new(),
                location: Path::default(),
                dir: true,
            });
        }
        let location = Path::parse(&sanitized)
            .map_err(|err| BucketError::InvalidPath(format!("{name}: {err}")))?;
        Ok(Self {
            path: sanitized,
            location,
            dir: SEP.is_dir_name(name),
        })
    }

    pub(crate) fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Spelled as a directory (trailing separator or the root).
    pub(crate) fn is_dir(&self) -> bool {
        self.dir
    }

    /// The same key taken as a directory.
    pub(crate) fn as_dir(&self) -> Self {
        Self {
            dir: true,
            ..self.clone()
        }
    }

    /// True when `other` names this key or something below it.
    pub(crate) fn contains(&self, other: &Key) -> bool {
        self.is_root() || other.location.prefix_matches(&self.location)
    }

    /// Item name: `a/b.txt` for files, `a/b/` for directories, `/` for the
    /// root.
    pub(crate) fn name(&self) -> String {
        if self.is_root() {
            SEP.to_string()
        } else if self.dir {
            SEP.directorize(&self.path)
        } else {
            self.path.clone()
        }
    }

    /// Object holding a file's content.
    pub(crate) fn file_path(&self) -> Result<Path> {
        if self.is_root() || self.dir {
            return Err(BucketError::IsADirectory { path: self.name() });
        }
        if self.location.filename() == Some(DIR_MARKER) {
            return Err(BucketError::InvalidPath(format!(
                "{}: {DIR_MARKER} is reserved for directory markers",
                self.path
            )));
        }
        Ok(self.location.clone())
    }

    /// Marker object of this key taken as a directory. `None` for the root,
    /// which is never marked.
    pub(crate) fn marker_path(&self) -> Option<Path> {
        if self.is_root() {
            None
        } else {
            Some(self.location.child(DIR_MARKER))
        }
    }

    /// Listing prefix of this key taken as a directory.
    pub(crate) fn prefix(&self) -> Option<Path> {
        if self.is_root() {
            None
        } else {
            Some(self.location.clone())
        }
    }

    /// Directory keys from the shallowest ancestor down to this key.
    pub(crate) fn ancestry(&self) -> Vec<Key> {
        let parts: Vec<_> = self.location.parts().collect();
        (1..=parts.len())
            .map(|depth| {
                let location: Path = parts[..depth].iter().cloned().collect();
                Key {
                    path: location.to_string(),
                    location,
                    dir: true,
                }
            })
            .collect()
    }
}

pub(crate) fn is_marker(path: &Path) -> bool {
    path.filename() == Some(DIR_MARKER)
}

/// Item name of a common prefix returned by a delimited listing.
pub(crate) fn dir_name(prefix: &Path) -> String {
    SEP.directorize(prefix.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let root = Key::parse("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.name(), "/");
        assert_eq!(Key::parse(".").unwrap(), root);
        assert_eq!(Key::parse("//").unwrap(), root);

        let file = Key::parse("/a//b.txt").unwrap();
        assert!(!file.is_dir());
        assert_eq!(file.name(), "a/b.txt");
        assert_eq!(file.file_path().unwrap().as_ref(), "a/b.txt");

        let dir = Key::parse("a/../b/c/").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.name(), "b/c/");
        assert_eq!(dir.marker_path().unwrap().as_ref(), "b/c/.dirmarker");
        assert_eq!(dir.prefix().unwrap().as_ref(), "b/c");
        assert!(dir.file_path().is_err());
    }

    #[test]
    fn test_marker_name_is_reserved() {
        let key = Key::parse("a/.dirmarker").unwrap();
        assert!(matches!(key.file_path(), Err(BucketError::InvalidPath(_))));
        assert!(is_marker(&Path::from("a/.dirmarker")));
        assert!(!is_marker(&Path::from("a/b")));
    }

    #[test]
    fn test_ancestry_is_shallowest_first() {
        let names: Vec<String> = Key::parse("a/b/c/")
            .unwrap()
            .ancestry()
            .iter()
            .map(Key::name)
            .collect();
        assert_eq!(names, vec!["a/", "a/b/", "a/b/c/"]);
        assert!(Key::parse("/").unwrap().ancestry().is_empty());
    }

    #[test]
    fn test_special_characters_are_stored_verbatim() {
        let key = Key::parse("dir/a#b.txt").unwrap();
        assert_eq!(key.file_path().unwrap().as_ref(), "dir/a#b.txt");

        let key = Key::parse("dir/50%/").unwrap();
        assert_eq!(key.marker_path().unwrap().as_ref(), "dir/50%/.dirmarker");
        assert_eq!(key.name(), "dir/50%/");
    }

    #[test]
    fn test_control_characters_are_rejected() {
        assert!(matches!(
            Key::parse("a/b\u{7}c"),
            Err(BucketError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_contains() {
        let dir = Key::parse("a/b/").unwrap();
        assert!(dir.contains(&Key::parse("a/b").unwrap()));
        assert!(dir.contains(&Key::parse("a/b/c.txt").unwrap()));
        assert!(!dir.contains(&Key::parse("a/bc").unwrap()));
        assert!(Key::parse("/").unwrap().contains(&dir));
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(dir_name(&Path::from("a/b")), "a/b/");
    }
}
