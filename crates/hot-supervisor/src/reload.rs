//! The watch, debounce and restart loop.

use std::future::Future;
use std::sync::Arc;

use hot_core::Config;
use hot_watcher::{Debouncer, ExtensionFilter, IgnoreSet, RebuildSignal, TreeWatcher};
use tokio::sync::mpsc;

use crate::command::{DEFAULT_TOOLCHAIN, LaunchPlan};
use crate::entry::resolve_entry;
use crate::error::{ReloadError, SupervisorError};
use crate::supervisor::Supervisor;

/// Drives a [`Supervisor`] from filesystem changes.
#[derive(Debug, Clone)]
pub struct Reloader {
    config: Config,
    toolchain: String,
    parallelism: Option<usize>,
}

impl Reloader {
    /// Creates a reloader for a validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            toolchain: DEFAULT_TOOLCHAIN.to_owned(),
            parallelism: None,
        }
    }

    /// Overrides the toolchain program.
    #[must_use]
    pub fn with_toolchain(mut self, program: impl Into<String>) -> Self {
        self.toolchain = program.into();
        self
    }

    /// Overrides the detected CPU count.
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Starts the program and restarts it after every debounced change,
    /// until `shutdown` resolves or a fatal error occurs.
    ///
    /// The supervised process is stopped before this returns, on every path.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: a missing entry file, a watcher that
    /// could not start or reported an error, a missing toolchain, or a run
    /// command that could not be spawned.
    pub async fn run<S>(self, shutdown: S) -> Result<(), ReloadError>
    where
        S: Future<Output = ()>,
    {
        let config = self.config;
        let root = config.path.as_path();

        let entry = resolve_entry(root, config.entry.as_deref())?;
        tracing::info!(entry = %entry, "Resolved entry file");

        let mut supervisor =
            Supervisor::new(LaunchPlan::new(&config, entry).with_toolchain(self.toolchain));
        if let Some(parallelism) = self.parallelism {
            supervisor = supervisor.with_parallelism(parallelism);
        }
        let supervisor = Arc::new(supervisor);

        let ignore = IgnoreSet::new(&config.ignore);
        let mut watcher = TreeWatcher::new(root, &ignore)?;
        let filter = ExtensionFilter::new(&config.extensions);
        tracing::info!(
            root = %watcher.root(),
            dirs = watcher.registered().len(),
            extensions = ?filter.extensions(),
            "Watching for changes"
        );

        let debouncer = Debouncer::new(config.debounce(), filter);
        let (signals, pending) = mpsc::unbounded_channel();

        let result = tokio::select! {
            res = serve(&supervisor, pending) => res.map_err(ReloadError::from),
            res = debouncer.run(watcher.stream_mut(), &signals) => res.map_err(ReloadError::from),
            () = shutdown => {
                tracing::info!("Shutdown requested");
                Ok(())
            }
        };

        supervisor.shutdown().await;
        tracing::info!("Stopped");
        result
    }
}

/// Starts the program once, then restarts it for each rebuild signal.
async fn serve(
    supervisor: &Supervisor,
    mut pending: mpsc::UnboundedReceiver<RebuildSignal>,
) -> Result<(), SupervisorError> {
    supervisor.restart().await?;

    while let Some(signal) = pending.recv().await {
        tracing::info!(
            path = %signal.last_change,
            coalesced = signal.coalesced,
            "Change detected, rebuilding"
        );
        supervisor.restart().await?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{FakeToolchain, is_alive};
    use std::fs;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn last_artifact_pid(fake: &FakeToolchain) -> u32 {
        fake.lines()
            .iter()
            .rev()
            .find_map(|l| l.strip_prefix("artifact "))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|pid| pid.parse().ok())
            .expect("artifact pid")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_change_triggers_single_rebuild() {
        let fake = FakeToolchain::new();
        let reloader = Reloader::new(fake.config("ok"))
            .with_toolchain(fake.script.as_str())
            .with_parallelism(8);

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(reloader.run(async move {
            let _ = stopped.await;
        }));

        fake.wait_for_count("artifact", 1).await;
        assert_eq!(fake.count("build"), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Ignored directory.
        fs::write(fake.root.join("vendor/x.go"), "package x\n").expect("write vendor");
        // Unwatched extension.
        fs::write(fake.root.join("notes.txt"), "hello\n").expect("write txt");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fake.count("build"), 1, "{:?}", fake.lines());

        for body in ["package main\n// a\n", "package main\n// b\n"] {
            fs::write(fake.root.join("main.go"), body).expect("write main.go");
        }
        fake.wait_for_count("artifact", 2).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fake.count("build"), 2, "{:?}", fake.lines());

        let pid = last_artifact_pid(&fake);
        assert!(is_alive(pid));

        stop.send(()).expect("reloader running");
        task.await.expect("task").expect("clean shutdown");
        assert!(!is_alive(pid));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_loop_survives_broken_build() {
        let fake = FakeToolchain::new();
        let reloader = Reloader::new(fake.config("broken"))
            .with_toolchain(fake.script.as_str())
            .with_parallelism(8);

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(reloader.run(async move {
            let _ = stopped.await;
        }));

        fake.wait_for_count("run ", 1).await;
        assert_eq!(fake.count("build"), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;

        fs::write(fake.root.join("main.go"), "package main\n// edit\n").expect("write main.go");
        fake.wait_for_count("run ", 2).await;
        assert_eq!(fake.count("build"), 2, "{:?}", fake.lines());
        assert!(!task.is_finished(), "loop ended after a fallback");

        stop.send(()).expect("reloader running");
        task.await.expect("task").expect("clean shutdown");
    }

    #[tokio::test]
    async fn test_missing_entry_is_fatal() {
        let fake = FakeToolchain::new();
        fs::remove_file(fake.entry()).expect("remove main.go");

        let err = Reloader::new(fake.config("ok"))
            .with_toolchain(fake.script.as_str())
            .run(std::future::pending())
            .await
            .expect_err("no entry");
        assert!(matches!(
            err,
            ReloadError::Supervisor(SupervisorError::EntryNotFound(_))
        ));
        assert!(fake.lines().is_empty());
    }

    #[tokio::test]
    async fn test_missing_toolchain_ends_loop() {
        let fake = FakeToolchain::new();
        let err = Reloader::new(fake.config("missing"))
            .with_toolchain(fake.script.as_str())
            .with_parallelism(8)
            .run(std::future::pending())
            .await
            .expect_err("toolchain missing");
        assert!(matches!(
            err,
            ReloadError::Supervisor(SupervisorError::ToolchainMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_stops_process() {
        let fake = FakeToolchain::new();
        let (stop, stopped) = oneshot::channel::<()>();
        let reloader = Reloader::new(fake.config("ok"))
            .with_toolchain(fake.script.as_str())
            .with_parallelism(2);

        let task = tokio::spawn(reloader.run(async move {
            let _ = stopped.await;
        }));

        let line = fake.wait_for_line("run ").await;
        let pid: u32 = line
            .split_whitespace()
            .nth(1)
            .and_then(|pid| pid.parse().ok())
            .expect("run pid");
        assert!(is_alive(pid));

        stop.send(()).expect("reloader running");
        task.await.expect("task").expect("clean shutdown");
        assert!(!is_alive(pid));
    }
}
