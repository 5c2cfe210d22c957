//! Toolchain command assembly.
//!
//! [`LaunchPlan`] captures everything needed to build or run the program
//! (entry, output, flags, CLI arguments, extra environment) and turns it
//! into ready-to-spawn [`tokio::process::Command`]s.
//!
//! The toolchain is driven by name with a fixed convention:
//!
//! ```text
//! <toolchain> build [flags...] -o <output> <entry>
//! <toolchain> run <entry> [cli...]
//! <output> [cli...]
//! ```

use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use hot_core::Config;
use tokio::process::Command;

/// Toolchain invoked when none is configured.
pub const DEFAULT_TOOLCHAIN: &str = "go";

/// Substring in build output that means the toolchain itself is unusable.
pub const TOOLCHAIN_MISSING_DIAGNOSTIC: &str = "go : unknown command";

/// Hosts with fewer logical CPUs than this skip compilation.
pub const MIN_COMPILE_PARALLELISM: usize = 4;

/// How the next process is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Build an artifact, then execute it.
    Compile,
    /// Hand the entry file straight to `<toolchain> run`.
    Interpret,
}

impl Strategy {
    /// Picks a strategy from the number of logical CPUs.
    #[must_use]
    pub const fn for_parallelism(parallelism: usize) -> Self {
        if parallelism >= MIN_COMPILE_PARALLELISM {
            Self::Compile
        } else {
            Self::Interpret
        }
    }
}

/// Returns `true` if captured build output shows the toolchain is missing.
#[must_use]
pub fn is_toolchain_missing(output: &str) -> bool {
    output.contains(TOOLCHAIN_MISSING_DIAGNOSTIC)
}

/// Normalizes configured build flags into argument tokens.
///
/// Each flag is trimmed, given a leading `-` if it lacks one, then split
/// with shell quoting rules. Blank flags and flags that fail to tokenize
/// are logged and dropped.
///
/// # Examples
///
/// ```
/// use hot_supervisor::command::normalize_build_flags;
///
/// let flags = vec!["race".to_owned(), "-ldflags '-s -w'".to_owned()];
/// assert_eq!(normalize_build_flags(&flags), ["-race", "-ldflags", "-s -w"]);
/// ```
pub fn normalize_build_flags(flags: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    for flag in flags {
        let flag = flag.trim();
        if flag.is_empty() {
            continue;
        }

        let flag = if flag.starts_with('-') {
            flag.to_owned()
        } else {
            format!("-{flag}")
        };

        match shlex::split(&flag) {
            Some(tokens) => args.extend(tokens),
            None => tracing::error!(flag = %flag, "Error parsing build flag, skipping"),
        }
    }
    args
}

/// Splits `KEY=VALUE` entries into pairs, preserving order.
///
/// Entries without `=` or with an empty key are logged and skipped. When a
/// key repeats, the later entry wins once applied to a command.
pub fn parse_env_entries(entries: &[String]) -> Vec<(String, String)> {
    entries
        .iter()
        .filter_map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Some((key.trim().to_owned(), value.to_owned()))
            }
            _ => {
                if !entry.trim().is_empty() {
                    tracing::warn!(entry = %entry, "Ignoring malformed environment entry");
                }
                None
            }
        })
        .collect()
}

/// Everything needed to build and run the supervised program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Toolchain program (`go`).
    pub toolchain: String,
    /// Entry source file.
    pub entry: Utf8PathBuf,
    /// Compiled artifact path.
    pub output: Utf8PathBuf,
    /// Normalized build flag tokens.
    pub build_flags: Vec<String>,
    /// Arguments for the running program.
    pub cli_args: Vec<String>,
    /// Extra environment, applied in order on top of the inherited one.
    pub envs: Vec<(String, String)>,
}

impl LaunchPlan {
    /// Derives a plan from a validated configuration and a resolved entry.
    pub fn new(config: &Config, entry: Utf8PathBuf) -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_owned(),
            entry,
            output: config.output.clone(),
            build_flags: normalize_build_flags(&config.flags),
            cli_args: config
                .cli
                .iter()
                .map(|arg| arg.trim().to_owned())
                .filter(|arg| !arg.is_empty())
                .collect(),
            envs: parse_env_entries(&config.envs),
        }
    }

    /// Overrides the toolchain program.
    #[must_use]
    pub fn with_toolchain(mut self, program: impl Into<String>) -> Self {
        self.toolchain = program.into();
        self
    }

    /// Arguments for `<toolchain> build`.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.build_flags.len() + 4);
        args.push("build".to_owned());
        args.extend(self.build_flags.iter().cloned());
        args.push("-o".to_owned());
        args.push(self.output.to_string());
        args.push(self.entry.to_string());
        args
    }

    /// Arguments for `<toolchain> run`.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.cli_args.len() + 2);
        args.push("run".to_owned());
        args.push(self.entry.to_string());
        args.extend(self.cli_args.iter().cloned());
        args
    }

    /// Path used to execute the artifact.
    ///
    /// A bare file name is prefixed with `./` so it is never looked up on
    /// `PATH`.
    pub fn artifact(&self) -> Utf8PathBuf {
        let bare = self.output.is_relative()
            && self
                .output
                .parent()
                .is_none_or(|parent| parent.as_str().is_empty());
        if bare {
            Utf8Path::new(".").join(&self.output)
        } else {
            self.output.clone()
        }
    }

    /// The build command, with output piped for capture.
    pub fn build_command(&self) -> Command {
        let mut cmd = self.base_command(&self.toolchain);
        cmd.args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// The `<toolchain> run` command with inherited standard streams.
    pub fn interpret_command(&self) -> Command {
        let mut cmd = self.base_command(&self.toolchain);
        cmd.args(self.run_args());
        inherit_stdio(&mut cmd);
        cmd
    }

    /// The command executing the built artifact with inherited streams.
    pub fn artifact_command(&self) -> Command {
        let mut cmd = self.base_command(self.artifact().as_str());
        cmd.args(&self.cli_args);
        inherit_stdio(&mut cmd);
        cmd
    }

    fn base_command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true);
        cmd
    }
}

fn inherit_stdio(cmd: &mut Command) {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
}
