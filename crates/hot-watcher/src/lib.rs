//! Directory tree watching with extension filtering and debouncing.
//!
//! This crate turns raw filesystem notifications into rebuild signals:
//!
//! - [`IgnoreSet`] and [`ExtensionFilter`] decide which paths matter
//! - [`TreeWatcher`] registers every eligible directory under the root and
//!   streams [`ChangeEvent`]s and backend errors over unbounded channels
//! - [`Debouncer`] collapses bursts of qualifying events into one
//!   [`RebuildSignal`], fired a quiet period after the last event
//!
//! # Crate Dependencies
//!
//! ```text
//! hot-cli ──► hot-supervisor ──► hot-watcher
//!                           └──► hot-core
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use hot_watcher::{Debouncer, ExtensionFilter, IgnoreSet, RebuildSignal, TreeWatcher};
//! use camino::Utf8Path;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), hot_watcher::WatchError> {
//! let mut watcher = TreeWatcher::new(Utf8Path::new("./"), &IgnoreSet::new(&[".git", "vendor"]))?;
//! let debouncer = Debouncer::new(Duration::from_millis(500), ExtensionFilter::new(&[".go"]));
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<RebuildSignal>();
//! tokio::spawn(async move {
//!     while let Some(signal) = rx.recv().await {
//!         println!("rebuild after {} changes", signal.coalesced);
//!     }
//! });
//!
//! debouncer.run(watcher.stream_mut(), &tx).await
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod debounce;
pub mod error;
pub mod events;
pub mod filter;
pub mod watcher;

pub use debounce::{DebounceState, Debouncer, RebuildSignal};
pub use error::WatchError;
pub use events::{ChangeEvent, ChangeKind};
pub use filter::{ExtensionFilter, FileFilter, IgnoreSet, is_watched_file};
pub use watcher::{TreeWatcher, WatchSink, WatchStream, watch_dirs};
