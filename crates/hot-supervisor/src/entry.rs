//! Entry file resolution.

use camino::{Utf8Path, Utf8PathBuf};
use hot_core::DEFAULT_ENTRY;

use crate::error::SupervisorError;

/// Resolves the entry file handed to the toolchain.
///
/// An explicit entry wins. Otherwise `main.go` must exist directly under
/// `root`.
///
/// # Errors
///
/// Returns [`SupervisorError::EntryNotFound`] when neither is available.
pub fn resolve_entry(
    root: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> Result<Utf8PathBuf, SupervisorError> {
    if let Some(entry) = explicit.filter(|e| !e.as_str().is_empty()) {
        return Ok(entry.to_owned());
    }

    let candidate = root.join(DEFAULT_ENTRY);
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(SupervisorError::EntryNotFound(candidate))
    }
}
