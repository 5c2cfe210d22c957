//! Error types for the hot-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while registering directories or while the watcher is running.

use camino::Utf8PathBuf;

/// Errors that can occur during file watching operations.
///
/// # Error Recovery Strategy
///
/// None of these are recoverable. A partially registered tree would silently
/// miss changes, so any registration or walk failure aborts the whole walk,
/// and any error delivered on the watcher's error stream ends the loop.
/// Non-UTF-8 paths are logged and skipped before they become errors.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Failed to initialize the notify watcher.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The backend reported an error while running.
    #[error("watcher error: {0}")]
    Backend(notify::Error),

    /// A directory could not be registered for notifications.
    #[error("failed to watch directory {path}: {source}")]
    Register {
        /// The directory that failed to register.
        path: Utf8PathBuf,
        /// The underlying notify error.
        #[source]
        source: notify::Error,
    },

    /// Directory traversal failed.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// The specified root path does not exist or is not a directory.
    #[error("path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_error_carries_path() {
        let err = WatchError::Register {
            path: Utf8PathBuf::from("/proj/pkg"),
            source: notify::Error::generic("too many watches"),
        };
        assert!(err.to_string().contains("/proj/pkg"));
        assert!(err.to_string().contains("too many watches"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = WatchError::Backend(notify::Error::generic("queue overflow"));
        assert!(err.to_string().starts_with("watcher error:"));
    }

    #[test]
    fn test_not_a_directory_display() {
        let err = WatchError::NotADirectory(Utf8PathBuf::from("/some/file"));
        assert_eq!(err.to_string(), "path is not a directory: /some/file");
    }
}
