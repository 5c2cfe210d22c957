//! The process supervisor.
//!
//! [`Supervisor`] owns the single child-process slot. Every transition
//! (stop the old process, start the new one) happens inside one async mutex,
//! so at most one child is alive at any instant and concurrent restart
//! requests queue up behind each other instead of interleaving.
//!
//! # Start Strategy
//!
//! ```text
//! parallelism < 4 ───────────────────────────────► <toolchain> run <entry>
//!
//! parallelism >= 4 ──► <toolchain> build ──ok────► <output> [cli...]
//!                                       │
//!                                       └─fail──┬─ "go : unknown command" ──► fatal
//!                                               └─ otherwise ─────────────► <toolchain> run <entry>
//! ```

use std::io;
use std::num::NonZeroUsize;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::Mutex;

use crate::command::{
    LaunchPlan, Strategy, TOOLCHAIN_MISSING_DIAGNOSTIC, is_toolchain_missing,
};
use crate::error::SupervisorError;

/// Why the entry file was interpreted instead of compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretReason {
    /// The host has too few CPUs for compilation to pay off.
    LowParallelism,
    /// The build failed with an ordinary error.
    BuildFailed,
}

/// How the current process was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// The compiled artifact is running.
    Compiled,
    /// `<toolchain> run` is running the entry file.
    Interpreted(InterpretReason),
}

/// Result of one successful restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launched {
    /// Process id of the new child, if the OS reported one.
    pub pid: Option<u32>,
    /// How the child was started.
    pub mode: LaunchMode,
}

/// Captured result of a build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BuildReport {
    success: bool,
    output: String,
}

/// Owns the supervised child process.
///
/// Share it behind an [`Arc`](std::sync::Arc) between the initial start and
/// the restart worker; both go through the same lock.
#[derive(Debug)]
pub struct Supervisor {
    plan: LaunchPlan,
    parallelism: usize,
    slot: Mutex<Option<Child>>,
}

impl Supervisor {
    /// Creates a supervisor with no process running.
    ///
    /// Parallelism defaults to the host's available logical CPUs.
    pub fn new(plan: LaunchPlan) -> Self {
        let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            plan,
            parallelism,
            slot: Mutex::new(None),
        }
    }

    /// Overrides the parallelism used to pick a [`Strategy`].
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Returns the strategy the next start will use.
    pub const fn strategy(&self) -> Strategy {
        Strategy::for_parallelism(self.parallelism)
    }

    /// Stops the current process (if any) and starts a new one.
    ///
    /// Holds the lock for the whole stop-then-start cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::ToolchainMissing`] when the build output
    /// shows the toolchain is unusable and [`SupervisorError::Spawn`] when
    /// the run command cannot start. The slot is empty in both cases.
    pub async fn restart(&self) -> Result<Launched, SupervisorError> {
        let mut slot = self.slot.lock().await;
        stop_child(&mut slot).await;

        let (child, mode) = self.start().await?;
        let launched = Launched {
            pid: child.id(),
            mode,
        };
        tracing::info!(pid = ?launched.pid, mode = ?launched.mode, "Process started");
        *slot = Some(child);
        Ok(launched)
    }

    /// Stops the current process, if any, and waits for it to be reaped.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        stop_child(&mut slot).await;
    }

    /// Returns the pid of the held process.
    pub async fn current_pid(&self) -> Option<u32> {
        self.slot.lock().await.as_ref().and_then(Child::id)
    }

    async fn start(&self) -> Result<(Child, LaunchMode), SupervisorError> {
        match self.strategy() {
            Strategy::Interpret => {
                tracing::info!(
                    parallelism = self.parallelism,
                    "Low CPU system, running with `{} run`",
                    self.plan.toolchain
                );
                let child = self.spawn_interpreter()?;
                Ok((child, LaunchMode::Interpreted(InterpretReason::LowParallelism)))
            }
            Strategy::Compile => {
                tracing::info!(output = %self.plan.output, "Compiling binary");
                let report = self.build().await?;

                if report.success {
                    tracing::info!("Build succeeded, running binary");
                    let artifact = self.plan.artifact();
                    let child = self.plan.artifact_command().spawn().map_err(|source| {
                        SupervisorError::Spawn {
                            program: artifact.into_string(),
                            source,
                        }
                    })?;
                    return Ok((child, LaunchMode::Compiled));
                }

                tracing::warn!(output = %report.output, "Build failed");
                if is_toolchain_missing(&report.output) {
                    tracing::error!("Detected unknown command error in build output, stopping");
                    return Err(SupervisorError::ToolchainMissing {
                        program: self.plan.toolchain.clone(),
                        diagnostic: TOOLCHAIN_MISSING_DIAGNOSTIC,
                    });
                }

                tracing::info!("Falling back to `{} run`", self.plan.toolchain);
                let child = self.spawn_interpreter()?;
                Ok((child, LaunchMode::Interpreted(InterpretReason::BuildFailed)))
            }
        }
    }

    fn spawn_interpreter(&self) -> Result<Child, SupervisorError> {
        self.plan
            .interpret_command()
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: self.plan.toolchain.clone(),
                source,
            })
    }

    /// Runs the build, teeing its output to our own streams.
    ///
    /// A compiler that cannot be spawned is reported as a failed build with
    /// no output.
    async fn build(&self) -> Result<BuildReport, SupervisorError> {
        let mut child = match self.plan.build_command().spawn() {
            Ok(child) => child,
            Err(error) => {
                tracing::warn!(
                    program = %self.plan.toolchain,
                    error = %error,
                    "Failed to start build"
                );
                return Ok(BuildReport {
                    success: false,
                    output: String::new(),
                });
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (mut captured, err) = tokio::try_join!(
            tee(stdout, tokio::io::stdout()),
            tee(stderr, tokio::io::stderr()),
        )?;
        captured.extend_from_slice(&err);

        let status = child.wait().await?;
        tracing::debug!(%status, "Build finished");

        Ok(BuildReport {
            success: status.success(),
            output: String::from_utf8_lossy(&captured).into_owned(),
        })
    }
}

/// Kills and reaps the held process. Failures are logged, never returned.
async fn stop_child(slot: &mut Option<Child>) {
    let Some(mut child) = slot.take() else {
        return;
    };
    let pid = child.id();

    match child.try_wait() {
        Ok(Some(status)) => {
            tracing::info!(?pid, %status, "Previous process already exited");
            return;
        }
        Ok(None) => {}
        Err(error) => tracing::warn!(?pid, error = %error, "Failed to poll process status"),
    }

    match child.kill().await {
        Ok(()) => tracing::debug!(?pid, "Stopped previous process"),
        Err(error) => tracing::warn!(?pid, error = %error, "Failed to stop previous process"),
    }
}

/// Copies `source` into `sink` while keeping a copy.
///
/// Read failures are errors. After the first passthrough write failure
/// (logged) the sink is skipped and capture continues.
async fn tee<R, W>(source: Option<R>, mut sink: W) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut captured = Vec::new();
    let Some(mut source) = source else {
        return Ok(captured);
    };

    let mut passthrough = true;
    let mut buf = [0u8; 4096];
    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if passthrough {
            let written = match sink.write_all(&buf[..n]).await {
                Ok(()) => sink.flush().await,
                Err(error) => Err(error),
            };
            if let Err(error) = written {
                tracing::debug!(error = %error, "Failed to pass build output through");
                passthrough = false;
            }
        }
        captured.extend_from_slice(&buf[..n]);
    }
    Ok(captured)
}
