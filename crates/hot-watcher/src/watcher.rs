//! Directory tree registration and the live event stream.
//!
//! [`TreeWatcher`] walks the root once, registers every eligible directory
//! with the platform backend (one non-recursive watch per directory), and
//! forwards backend callbacks into two unbounded tokio channels.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                notify backend thread                          │
//! │  RecommendedWatcher ──callback──► WatchSink::forward          │
//! └───────────────────────────────────────┬──────────────────────┘
//!                        events (unbounded)│ errors (unbounded)
//!                                          ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                async runtime (tokio)                          │
//! │  WatchStream ──► Debouncer::run ──► RebuildSignal             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Directories created after startup are not registered.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::events::ChangeEvent;
use crate::filter::IgnoreSet;

/// Prefix marking hidden entries.
const HIDDEN_PREFIX: char = '.';

/// Producer half of a [`WatchStream`], owned by the backend callback.
#[derive(Debug, Clone)]
pub struct WatchSink {
    events: mpsc::UnboundedSender<ChangeEvent>,
    errors: mpsc::UnboundedSender<notify::Error>,
}

impl WatchSink {
    /// Forwards one backend callback result into the stream.
    ///
    /// Sends are dropped silently once the stream has gone away.
    pub fn forward(&self, result: notify::Result<notify::Event>) {
        match result {
            Ok(event) => {
                for change in ChangeEvent::from_notify(event) {
                    tracing::trace!(path = %change.path, op = %change.kind, "Raw change event");
                    if self.events.send(change).is_err() {
                        tracing::debug!("Event channel closed, dropping event");
                        break;
                    }
                }
            }
            Err(error) => {
                if self.errors.send(error).is_err() {
                    tracing::debug!("Error channel closed, dropping watcher error");
                }
            }
        }
    }

    /// Sends a change event directly.
    pub fn send_event(&self, event: ChangeEvent) {
        let _ = self.events.send(event);
    }

    /// Sends a watcher error directly.
    pub fn send_error(&self, error: notify::Error) {
        let _ = self.errors.send(error);
    }
}

/// Consumer half: the change-event and watcher-error streams.
#[derive(Debug)]
pub struct WatchStream {
    pub(crate) events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub(crate) errors: mpsc::UnboundedReceiver<notify::Error>,
}

impl WatchStream {
    /// Creates a connected sink/stream pair.
    #[must_use]
    pub fn channel() -> (WatchSink, Self) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (errors_tx, errors) = mpsc::unbounded_channel();
        (
            WatchSink {
                events: events_tx,
                errors: errors_tx,
            },
            Self { events, errors },
        )
    }
}

/// A watcher over a whole directory tree.
///
/// Dropping the `TreeWatcher` unregisters everything and closes the streams.
pub struct TreeWatcher {
    /// Kept alive for the lifetime of the registrations.
    _watcher: RecommendedWatcher,
    stream: WatchStream,
    root: Utf8PathBuf,
    registered: Vec<Utf8PathBuf>,
}

impl std::fmt::Debug for TreeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeWatcher")
            .field("root", &self.root)
            .field("registered", &self.registered.len())
            .finish_non_exhaustive()
    }
}

impl TreeWatcher {
    /// Walks `root` and registers every eligible directory.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NotADirectory`] if `root` is not a directory,
    /// [`WatchError::Notify`] if the backend cannot start, and
    /// [`WatchError::Walk`] or [`WatchError::Register`] if any directory in
    /// the tree cannot be traversed or registered. No partial watch is kept.
    pub fn new(root: &Utf8Path, ignore: &IgnoreSet) -> Result<Self, WatchError> {
        if !root.is_dir() {
            return Err(WatchError::NotADirectory(root.to_owned()));
        }

        let (sink, stream) = WatchStream::channel();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                sink.forward(res);
            })?;

        let registered = watch_dirs(root, ignore)?;
        for dir in &registered {
            watcher
                .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Register {
                    path: dir.clone(),
                    source,
                })?;
            tracing::trace!(path = %dir, "Registered directory");
        }

        tracing::info!(root = %root, directories = registered.len(), "File watcher started");

        Ok(Self {
            _watcher: watcher,
            stream,
            root: root.to_owned(),
            registered,
        })
    }

    /// Returns the watched root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns every registered directory, in walk order.
    #[must_use]
    pub fn registered(&self) -> &[Utf8PathBuf] {
        &self.registered
    }

    /// Returns the event and error streams.
    pub fn stream_mut(&mut self) -> &mut WatchStream {
        &mut self.stream
    }
}

/// Lists the directories under `root` that should be registered.
///
/// Ignored directories are pruned with their whole subtree, and so are
/// entries whose names are not valid UTF-8 (logged). Hidden directories are
/// not registered, but their children are still visited. The root itself is
/// always included.
///
/// # Errors
///
/// Any traversal error aborts the walk.
pub fn watch_dirs(root: &Utf8Path, ignore: &IgnoreSet) -> Result<Vec<Utf8PathBuf>, WatchError> {
    let ignore = Arc::new(ignore.clone());
    let walk_root = root.to_owned();

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let Some(path) = Utf8Path::from_path(entry.path()) else {
                tracing::warn!(
                    path = %entry.path().display(),
                    "Skipping non-UTF-8 path"
                );
                return false;
            };
            let name = path.file_name().unwrap_or_default();
            let relative = path.strip_prefix(&walk_root).unwrap_or(path);
            let skip = ignore.is_ignored(relative, name) || ignore.is_ignored(path, name);
            if skip {
                tracing::debug!(path = %path, "Skipping ignored path");
            }
            !skip
        })
        .build();

    let mut dirs = Vec::new();
    for result in walker {
        let entry = result?;
        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }

        let Some(path) = Utf8Path::from_path(entry.path()) else {
            continue;
        };

        if entry.depth() > 0
            && path
                .file_name()
                .is_some_and(|name| name.starts_with(HIDDEN_PREFIX))
        {
            tracing::trace!(path = %path, "Not registering hidden directory");
            continue;
        }

        dirs.push(path.to_owned());
    }

    Ok(dirs)
}
