//! Lexical path algebra parameterized by a bucket's separator.
//!
//! None of these functions touch storage. They follow the usual shortest-path
//! cleaning rules (collapse repeated separators, drop `.` segments, resolve
//! `..` against the preceding segment) but over an arbitrary separator
//! character, so a bucket whose keys use `/` behaves the same on every host.

use std::fmt;

/// A path separator together with the path functions that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Separator(char);

impl Separator {
    /// `/`, used by object store keys.
    pub const SLASH: Separator = Separator('/');

    pub const fn new(sep: char) -> Self {
        Self(sep)
    }

    /// The host filesystem separator.
    pub const fn native() -> Self {
        Self(std::path::MAIN_SEPARATOR)
    }

    pub fn as_char(&self) -> char {
        self.0
    }

    /// Last element of `p`. Trailing separators are ignored; an empty path
    /// yields `.` and a path made only of separators yields the separator.
    pub fn base(&self, p: &str) -> String {
        if p.is_empty() {
            return ".".to_string();
        }
        let trimmed = p.trim_end_matches(self.0);
        if trimmed.is_empty() {
            return self.to_string();
        }
        match trimmed.rfind(self.0) {
            Some(i) => trimmed[i + self.0.len_utf8()..].to_string(),
            None => trimmed.to_string(),
        }
    }

    /// Everything but the last element of `p`, cleaned. A path without any
    /// separator yields `.`.
    pub fn dir(&self, p: &str) -> String {
        match p.rfind(self.0) {
            Some(i) => self.clean_lexical(&p[..i + self.0.len_utf8()]),
            None => ".".to_string(),
        }
    }

    /// Trim surrounding whitespace and reduce `p` to its shortest equivalent
    /// form. The empty path cleans to `.`.
    pub fn clean(&self, p: &str) -> String {
        self.clean_lexical(p.trim())
    }

    /// Resolve `p` as if rooted at the bucket root, keeping the input's
    /// absoluteness: `foo/../bar/` becomes `bar`, `/../../foo` becomes `/foo`.
    pub fn abs(&self, p: &str) -> String {
        let rooted = p.starts_with(self.0);
        let resolved = if rooted {
            self.clean_lexical(p)
        } else {
            self.clean_lexical(&format!("{}{}", self.0, p))
        };
        if rooted {
            resolved
        } else {
            resolved
                .strip_prefix(self.0)
                .map(str::to_string)
                .unwrap_or(resolved)
        }
    }

    /// Turn an arbitrary caller-supplied name into a key relative to the
    /// bucket root that cannot escape it. Anything resolving to the root
    /// (including the empty string) comes back as the separator itself.
    pub fn sanitize(&self, p: &str) -> String {
        let cleaned = self.abs(&self.clean(p));
        let cleaned = cleaned.trim_start_matches('.');
        if cleaned.is_empty() || cleaned.chars().all(|c| c == self.0) {
            return self.to_string();
        }
        cleaned.trim_start_matches(self.0).to_string()
    }

    /// True when the sanitized key `child` is `parent` or lies below it.
    /// The root contains every key.
    pub fn is_within(&self, parent: &str, child: &str) -> bool {
        if self.is_root(parent) || parent == child {
            return true;
        }
        child
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with(self.0))
    }

    /// Like [`Separator::sanitize`] but keeps a trailing separator on names
    /// that denote a directory.
    pub fn sanitize_name(&self, p: &str) -> String {
        let dir = self.is_dir_name(p);
        let name = self.sanitize(p);
        if dir && !self.is_root(&name) {
            self.directorize(&name)
        } else {
            name
        }
    }

    /// Join the non-empty elements with the separator and clean the result.
    /// Joining nothing but empty elements yields the empty string.
    pub fn join<S: AsRef<str>>(&self, elems: &[S]) -> String {
        let trimmed: Vec<&str> = elems.iter().map(|e| e.as_ref().trim()).collect();
        match trimmed.iter().position(|e| !e.is_empty()) {
            Some(first) => self.clean_lexical(&trimmed[first..].join(&self.to_string())),
            None => String::new(),
        }
    }

    /// Append a trailing separator unless one is already present. `.` and
    /// the empty string both name the root.
    pub fn directorize(&self, p: &str) -> String {
        let p = p.trim();
        if p.is_empty() || p == "." {
            return self.to_string();
        }
        if p.ends_with(self.0) {
            p.to_string()
        } else {
            format!("{}{}", p, self.0)
        }
    }

    /// Whether `p` is spelled as a directory: it ends with the separator or
    /// names the root.
    pub fn is_dir_name(&self, p: &str) -> bool {
        let p = p.trim();
        p.is_empty() || p == "." || p.ends_with(self.0)
    }

    pub fn is_root(&self, p: &str) -> bool {
        let p = p.trim();
        p.is_empty() || p == "." || p.chars().all(|c| c == self.0)
    }

    fn clean_lexical(&self, p: &str) -> String {
        if p.is_empty() {
            return ".".to_string();
        }
        let rooted = p.starts_with(self.0);
        let mut out: Vec<&str> = Vec::new();
        for segment in p.split(self.0) {
            match segment {
                "" | "." => {}
                ".." => match out.last() {
                    Some(last) if *last != ".." => {
                        out.pop();
                    }
                    _ if rooted => {}
                    _ => out.push(".."),
                },
                other => out.push(other),
            }
        }
        let joined = out.join(&self.to_string());
        if rooted {
            format!("{}{}", self.0, joined)
        } else if joined.is_empty() {
            ".".to_string()
        } else {
            joined
        }
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::SLASH
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: Separator = Separator::SLASH;

    #[test]
    fn test_clean() {
        let cases = [
            ("", "."),
            ("////", "/"),
            ("  a//b/./c/  ", "a/b/c"),
            ("a/b/../c", "a/c"),
            ("../../a", "../../a"),
            ("/../a", "/a"),
            ("a/..", "."),
        ];
        for (input, expected) in cases {
            assert_eq!(PS.clean(input), expected, "clean({input:?})");
        }
    }

    #[test]
    fn test_base_and_dir() {
        assert_eq!(PS.base(""), ".");
        assert_eq!(PS.base("///"), "/");
        assert_eq!(PS.base("a/b/c/"), "c");
        assert_eq!(PS.base("c"), "c");
        assert_eq!(PS.dir("a/b/c"), "a/b");
        assert_eq!(PS.dir("a/b/c/"), "a/b/c");
        assert_eq!(PS.dir("c"), ".");
        assert_eq!(PS.dir("/c"), "/");
    }

    #[test]
    fn test_base_of_join() {
        assert_eq!(PS.base(&PS.join(&["b", "a/b/c/"])), "c");
    }

    #[test]
    fn test_join() {
        let cases: [(&[&str], &str); 6] = [
            (&["//path/", "to/", "//join"], "/path/to/join"),
            (&[], ""),
            (&["test\\", "foo/"], "test\\/foo"),
            (&["", "", " ", "/"], "/"),
            (&["test/"], "test"),
            (&["a", "", "b"], "a/b"),
        ];
        for (elems, expected) in cases {
            assert_eq!(PS.join(elems), expected, "join({elems:?})");
        }
    }

    #[test]
    fn test_join_is_clean() {
        let lists: [&[&str]; 5] = [
            &["a/", "./b", "../c/"],
            &["/x", "y//z"],
            &["..", "q"],
            &[" spaced ", "name"],
            &["/"],
        ];
        for elems in lists {
            let joined = PS.join(elems);
            assert_eq!(PS.clean(&joined), joined, "join({elems:?})");
        }
    }

    #[test]
    fn test_abs() {
        let cases = [
            ("/../../foo/bar", "/foo/bar"),
            ("foo/../bar/", "bar"),
            ("foo/./bar/", "foo/bar"),
            (".", ""),
            ("", ""),
            ("///", "/"),
            ("..", ""),
            ("...", "..."),
        ];
        for (input, expected) in cases {
            assert_eq!(PS.abs(input), expected, "abs({input:?})");
        }
    }

    #[test]
    fn test_sanitize() {
        let cases = [
            ("/test1//////test2//test3//test4", "test1/test2/test3/test4"),
            ("", "/"),
            ("  ", "/"),
            ("////", "/"),
            ("....", "/"),
            ("/foo/bar/../baz", "foo/baz"),
            ("../../etc/passwd", "etc/passwd"),
            (".hidden/file", "hidden/file"),
        ];
        for (input, expected) in cases {
            assert_eq!(PS.sanitize(input), expected, "sanitize({input:?})");
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "", "/", "a/b/", "../x/../../y", ".../z", "  /a//./b  ", "....", "a/..",
        ];
        for input in inputs {
            let once = PS.sanitize(input);
            assert_eq!(PS.sanitize(&once), once, "sanitize({input:?})");
        }
    }

    #[test]
    fn test_sanitize_name_keeps_directory_suffix() {
        assert_eq!(PS.sanitize_name("a/b/"), "a/b/");
        assert_eq!(PS.sanitize_name("/a/../b"), "b");
        assert_eq!(PS.sanitize_name("."), "/");
        assert_eq!(PS.sanitize_name("/"), "/");
    }

    #[test]
    fn test_custom_separator() {
        let ps = Separator::new('\\');
        assert_eq!(ps.join(&["a\\", "b"]), "a\\b");
        assert_eq!(ps.sanitize("\\..\\x\\\\y"), "x\\y");
        assert_eq!(ps.base("a\\b\\"), "b");
        assert_eq!(ps.directorize("a"), "a\\");
    }

    #[test]
    fn test_is_within() {
        assert!(PS.is_within("a", "a"));
        assert!(PS.is_within("a", "a/b/c"));
        assert!(PS.is_within("/", "a"));
        assert!(!PS.is_within("a", "ab"));
        assert!(!PS.is_within("a/b", "a"));
    }

    #[test]
    fn test_directorize() {
        assert_eq!(PS.directorize(""), "/");
        assert_eq!(PS.directorize("."), "/");
        assert_eq!(PS.directorize("a"), "a/");
        assert_eq!(PS.directorize("a/"), "a/");
        assert!(PS.is_dir_name("a/"));
        assert!(PS.is_dir_name(""));
        assert!(!PS.is_dir_name("a"));
    }
}
