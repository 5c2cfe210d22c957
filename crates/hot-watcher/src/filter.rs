//! Path filtering for watch events and directory traversal.
//!
//! Two independent predicates:
//!
//! - [`FileFilter`] decides whether a changed file should count toward a
//!   rebuild. [`ExtensionFilter`] is a plain suffix match.
//! - [`IgnoreSet`] decides whether a directory (and its subtree) is excluded
//!   from registration.
//!
//! # Examples
//!
//! ```
//! use hot_watcher::{ExtensionFilter, FileFilter, IgnoreSet};
//! use camino::Utf8Path;
//!
//! let filter = ExtensionFilter::new(&[".go", ".yaml"]);
//! assert!(filter.should_process(Utf8Path::new("cmd/main.go")));
//! assert!(!filter.should_process(Utf8Path::new("README.md")));
//!
//! let ignore = IgnoreSet::new(&["vendor", "internal/gen"]);
//! assert!(ignore.is_ignored(Utf8Path::new("internal/gen"), "gen"));
//! assert!(ignore.is_ignored(Utf8Path::new("pkg/vendor"), "vendor"));
//! assert!(!ignore.is_ignored(Utf8Path::new("pkg/gen"), "gen"));
//! ```

use camino::Utf8Path;
use smallvec::SmallVec;

/// A filter for determining which file events count toward a rebuild.
///
/// Filters are consulted by the debouncer for every change event, so they
/// must be cheap and side-effect free.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if a change to `path` should be processed.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Returns `true` iff `name` ends with one of `extensions`.
///
/// Plain, case-sensitive suffix match: `.go` matches `main.go` and also
/// `foo.pb.go`. An empty extension list matches nothing.
#[inline]
pub fn is_watched_file<S: AsRef<str>>(name: &str, extensions: &[S]) -> bool {
    extensions.iter().any(|ext| name.ends_with(ext.as_ref()))
}

/// A filter that accepts files ending with any of the configured suffixes.
///
/// Suffixes include the leading dot (`.go`), unlike [`Utf8Path::extension`],
/// so multi-part suffixes such as `.pb.go` work as expected.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    extensions: SmallVec<[String; 4]>,
}

impl ExtensionFilter {
    /// Creates a new extension filter.
    ///
    /// # Arguments
    ///
    /// * `extensions` - The suffixes to accept, including the leading dot
    #[must_use]
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions.iter().map(|s| s.as_ref().to_owned()).collect(),
        }
    }

    /// Returns the configured suffixes.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl FileFilter for ExtensionFilter {
    #[inline]
    fn should_process(&self, path: &Utf8Path) -> bool {
        is_watched_file(path.as_str(), &self.extensions)
    }
}

/// Directory names and paths excluded from traversal.
///
/// An entry matches when it equals either the entry's base name or its full
/// path (relative to the watched root, or as produced by the walk).
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    entries: SmallVec<[String; 4]>,
}

impl IgnoreSet {
    /// Creates an ignore set from names or relative paths.
    ///
    /// Trailing slashes are stripped so `vendor/` and `vendor` behave alike.
    #[must_use]
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| e.as_ref().trim_end_matches('/').to_owned())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Returns `true` iff `path` or `name` exactly equals an entry.
    #[must_use]
    pub fn is_ignored(&self, path: &Utf8Path, name: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry == name || entry == path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_watched_file_suffix_match() {
        let exts = [".go", ".yaml"];
        assert!(is_watched_file("main.go", &exts));
        assert!(is_watched_file("/proj/config.yaml", &exts));
        assert!(is_watched_file("api.pb.go", &exts));
        assert!(!is_watched_file("main.Go", &exts));
        assert!(!is_watched_file("main.go.swp", &exts));
        assert!(!is_watched_file("Makefile", &exts));
    }

    #[test]
    fn test_is_watched_file_empty_set() {
        let none: [&str; 0] = [];
        assert!(!is_watched_file("main.go", &none));
        assert!(!is_watched_file("", &none));
    }

    #[test]
    fn test_is_watched_file_order_irrelevant() {
        for name in ["a.go", "b.yaml", "c.txt"] {
            assert_eq!(
                is_watched_file(name, &[".go", ".yaml"]),
                is_watched_file(name, &[".yaml", ".go"])
            );
        }
    }

    #[test]
    fn test_extension_filter() {
        let filter = ExtensionFilter::new(&[".go"]);
        assert!(filter.should_process(Utf8Path::new("/proj/main.go")));
        assert!(!filter.should_process(Utf8Path::new("/proj/go.mod")));
        assert_eq!(filter.extensions(), [".go"]);
    }

    #[test]
    fn test_ignore_by_name_and_path() {
        let ignore = IgnoreSet::new(&[".git", "vendor/", "internal/gen"]);

        assert!(ignore.is_ignored(Utf8Path::new("vendor"), "vendor"));
        assert!(ignore.is_ignored(Utf8Path::new("a/b/vendor"), "vendor"));
        assert!(ignore.is_ignored(Utf8Path::new(".git"), ".git"));
        assert!(ignore.is_ignored(Utf8Path::new("internal/gen"), "gen"));

        assert!(!ignore.is_ignored(Utf8Path::new("other/gen"), "gen"));
        assert!(!ignore.is_ignored(Utf8Path::new("vendored"), "vendored"));
    }

    #[test]
    fn test_ignore_set_skips_blank_entries() {
        let ignore = IgnoreSet::new(&["", "/"]);
        assert!(!ignore.is_ignored(Utf8Path::new(""), ""));
        assert!(!ignore.is_ignored(Utf8Path::new("/"), "/"));
    }
}
