//! Error types for the hot-supervisor crate.

use camino::Utf8PathBuf;

/// Errors raised by the process supervisor.
///
/// Every variant is fatal. Recoverable conditions (an ordinary build failure,
/// a stale process that refuses to die) are logged inside the supervisor and
/// never surface here.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SupervisorError {
    /// No entry file was configured and none exists under the root.
    #[error("cannot locate main file: {0} not found")]
    EntryNotFound(Utf8PathBuf),

    /// The build output shows the toolchain itself could not run.
    #[error("toolchain '{program}' is unavailable (build output reported '{diagnostic}')")]
    ToolchainMissing {
        /// The toolchain program that was invoked.
        program: String,
        /// The diagnostic that was matched.
        diagnostic: &'static str,
    },

    /// The run command could not be started.
    #[error("error starting command '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the build output or waiting for the build failed.
    #[error("build I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end the reload loop.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// The watcher failed to start or reported an error.
    #[error(transparent)]
    Watch(#[from] hot_watcher::WatchError),

    /// The supervisor hit a fatal condition.
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}
