//! Change event types.
//!
//! The platform backend reports rich [`notify::EventKind`]s. The reload loop
//! only needs to know which operation happened, so events are flattened to
//! one [`ChangeEvent`] per affected path.
//!
//! # Event Flow
//!
//! ```text
//! notify::Event (one kind, N paths)
//!        │
//!        ▼
//!   ChangeEvent::from_notify  (one per UTF-8 path)
//!        │
//!        ▼
//!   unbounded channel -> Debouncer
//! ```

use camino::Utf8PathBuf;
use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};
use smallvec::SmallVec;

/// The operation observed on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File contents were written.
    Write,
    /// A file was created (including the destination of a rename).
    Create,
    /// A file was removed.
    Remove,
    /// A file was renamed away.
    Rename,
    /// Only metadata (permissions, timestamps) changed.
    Chmod,
}

impl ChangeKind {
    /// Returns `true` for operations that can trigger a rebuild.
    ///
    /// Write, create, and remove qualify. A rename source or metadata change
    /// alone does not.
    #[inline]
    #[must_use]
    pub const fn qualifies(self) -> bool {
        matches!(self, Self::Write | Self::Create | Self::Remove)
    }

    /// Short label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Create => "create",
            Self::Remove => "remove",
            Self::Rename => "rename",
            Self::Chmod => "chmod",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single filesystem change on a UTF-8 path.
///
/// # Examples
///
/// ```
/// use hot_watcher::{ChangeEvent, ChangeKind};
/// use camino::Utf8PathBuf;
///
/// let event = ChangeEvent::new(Utf8PathBuf::from("cmd/main.go"), ChangeKind::Write);
/// assert!(event.kind.qualifies());
/// assert_eq!(event.file_name(), Some("main.go"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The path that changed.
    pub path: Utf8PathBuf,

    /// What happened to it.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Creates a change event.
    #[inline]
    #[must_use]
    pub const fn new(path: Utf8PathBuf, kind: ChangeKind) -> Self {
        Self { path, kind }
    }

    /// Returns the file name without the directory path.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Flattens a backend event into one change event per path.
    ///
    /// Access events yield nothing. For a two-path rename (`Both`) the first
    /// path is the source and the second the destination. A rename whose side
    /// is unknown (`Any`, as FSEvents reports both halves) counts as a create.
    /// Non-UTF-8 paths are logged and skipped.
    pub fn from_notify(event: notify::Event) -> SmallVec<[Self; 2]> {
        let mut out = SmallVec::new();

        for (index, path) in event.paths.into_iter().enumerate() {
            let Some(kind) = classify(event.kind, index) else {
                continue;
            };

            match Utf8PathBuf::try_from(path) {
                Ok(path) => out.push(Self::new(path, kind)),
                Err(e) => {
                    let invalid_path = e.into_path_buf();
                    tracing::warn!(
                        path = %invalid_path.display(),
                        "Skipping non-UTF-8 path in file event"
                    );
                }
            }
        }

        out
    }
}

/// Maps a backend event kind to an operation for the path at `index`.
fn classify(kind: EventKind, index: usize) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Create),
        EventKind::Remove(_) => Some(ChangeKind::Remove),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(ChangeKind::Chmod),
        EventKind::Modify(ModifyKind::Name(mode)) => Some(match mode {
            RenameMode::To | RenameMode::Any => ChangeKind::Create,
            RenameMode::Both if index > 0 => ChangeKind::Create,
            _ => ChangeKind::Rename,
        }),
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => Some(ChangeKind::Write),
        EventKind::Access(_) => None,
    }
}
