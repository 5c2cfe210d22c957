//! Trailing-edge debouncing of change events into rebuild signals.
//!
//! The [`Debouncer`] is a two-state machine:
//!
//! ```text
//!            qualifying event (re-arm deadline)
//!          ┌──────────────┐
//!          ▼              │
//!   Idle ──────────► Pending ──deadline──► Idle   (emit RebuildSignal)
//!        qualifying
//!          event
//! ```
//!
//! Every qualifying event pushes the deadline to `now + window`, so a burst
//! fires once, `window` after its last event. There is no maximum burst
//! length: a continuous stream of changes postpones the rebuild indefinitely.
//!
//! The deadline lives inside the single task running [`Debouncer::run`], so
//! re-arming can never race with a stale fire.

use std::time::Duration;

use camino::Utf8PathBuf;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::WatchError;
use crate::events::ChangeEvent;
use crate::filter::FileFilter;
use crate::watcher::WatchStream;

/// Request to stop the running process and start a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSignal {
    /// The last qualifying path seen before the deadline passed.
    pub last_change: Utf8PathBuf,

    /// How many qualifying events were coalesced into this signal.
    pub coalesced: usize,
}

/// Whether a rebuild is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No deadline armed.
    Idle,
    /// A deadline is armed and at least one change is waiting.
    Pending,
}

/// Coalesces qualifying change events into [`RebuildSignal`]s.
///
/// # Examples
///
/// ```
/// use hot_watcher::{ChangeEvent, ChangeKind, DebounceState, Debouncer, ExtensionFilter};
/// use camino::Utf8PathBuf;
/// use std::time::Duration;
/// use tokio::time::Instant;
///
/// let mut debouncer = Debouncer::new(Duration::from_millis(300), ExtensionFilter::new(&[".go"]));
/// let now = Instant::now();
///
/// let event = ChangeEvent::new(Utf8PathBuf::from("main.go"), ChangeKind::Write);
/// assert!(debouncer.observe(&event, now));
/// assert_eq!(debouncer.state(), DebounceState::Pending);
/// assert_eq!(debouncer.deadline(), Some(now + Duration::from_millis(300)));
///
/// let signal = debouncer.fire().expect("a change is pending");
/// assert_eq!(signal.coalesced, 1);
/// assert_eq!(debouncer.state(), DebounceState::Idle);
/// ```
#[derive(Debug)]
pub struct Debouncer<F> {
    window: Duration,
    filter: F,
    deadline: Option<Instant>,
    changed: bool,
    last_change: Option<Utf8PathBuf>,
    coalesced: usize,
}

impl<F: FileFilter> Debouncer<F> {
    /// Creates an idle debouncer with the given quiet period.
    pub const fn new(window: Duration, filter: F) -> Self {
        Self {
            window,
            filter,
            deadline: None,
            changed: false,
            last_change: None,
            coalesced: 0,
        }
    }

    /// Returns the current state.
    pub const fn state(&self) -> DebounceState {
        if self.deadline.is_some() {
            DebounceState::Pending
        } else {
            DebounceState::Idle
        }
    }

    /// Returns the armed deadline, if any.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Feeds one change event observed at `now`.
    ///
    /// Returns `true` if the event qualified and (re)armed the deadline.
    pub fn observe(&mut self, event: &ChangeEvent, now: Instant) -> bool {
        if !event.kind.qualifies() || !self.filter.should_process(&event.path) {
            tracing::trace!(path = %event.path, op = %event.kind, "Filtered out change event");
            return false;
        }

        tracing::info!(path = %event.path, op = %event.kind, "File changed");
        self.changed = true;
        self.coalesced += 1;
        self.last_change = Some(event.path.clone());
        self.deadline = Some(now + self.window);
        true
    }

    /// Disarms the deadline and emits a signal if a change is pending.
    pub fn fire(&mut self) -> Option<RebuildSignal> {
        self.deadline = None;
        if !self.changed {
            return None;
        }
        self.changed = false;
        Some(RebuildSignal {
            last_change: self.last_change.take().unwrap_or_default(),
            coalesced: std::mem::take(&mut self.coalesced),
        })
    }

    /// Runs the debounce loop until the stream closes or fails.
    ///
    /// Errors are checked first, then change events, then the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Backend`] for the first error delivered on the
    /// watcher's error stream.
    pub async fn run(
        mut self,
        stream: &mut WatchStream,
        signals: &mpsc::UnboundedSender<RebuildSignal>,
    ) -> Result<(), WatchError> {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;

                error = stream.errors.recv() => {
                    let Some(error) = error else {
                        tracing::debug!("Watcher error stream closed");
                        return Ok(());
                    };
                    tracing::error!(error = %error, "Watcher error");
                    return Err(WatchError::Backend(error));
                }

                event = stream.events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("Watcher event stream closed");
                        return Ok(());
                    };
                    self.observe(&event, Instant::now());
                }

                () = sleep_until(deadline) => {
                    if let Some(signal) = self.fire() {
                        tracing::debug!(
                            path = %signal.last_change,
                            coalesced = signal.coalesced,
                            "Debounce window elapsed"
                        );
                        if signals.send(signal).is_err() {
                            tracing::debug!("Rebuild receiver dropped, stopping debouncer");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when nothing is armed.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
