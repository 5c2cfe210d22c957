//! CLI entry point for gohot.
//!
//! Watches a Go project and rebuilds and restarts it whenever a watched file
//! changes.
//!
//! # Usage
//!
//! ```bash
//! gohot [OPTIONS] [COMMAND]
//!
//! # Watch the current directory using ./gohot.yaml if present
//! gohot
//!
//! # Override config values from the command line
//! gohot -p ./service -e .go,.tmpl -d 300 -c --port -c 8080
//!
//! # Write a starter gohot.yaml
//! gohot init
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{WrapErr, bail};
use hot_core::{CONFIG_FILE_NAMES, Config, DEFAULT_CONFIG_YAML};
use hot_supervisor::Reloader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Live reload for Go programs.
///
/// Watches the project tree, debounces changes, then rebuilds and restarts
/// the program.
#[derive(Parser, Debug)]
#[command(name = "gohot", version, about, long_about = None)]
struct Cli {
    /// Command to execute. Watches the project when omitted.
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,

    /// Enable verbose logging (debug level).
    #[arg(long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Write a default gohot.yaml in the current directory.
    #[command(visible_alias = "i")]
    Init,

    /// Print the version number.
    Version,
}

/// Values that override the config file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Project root to watch.
    #[arg(short, long)]
    path: Option<Utf8PathBuf>,

    /// File extensions to watch (comma-separated).
    #[arg(short, long = "ext", value_delimiter = ',')]
    ext: Vec<String>,

    /// Paths to ignore (comma-separated).
    #[arg(short, long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Output path of the compiled binary.
    #[arg(short, long)]
    out: Option<Utf8PathBuf>,

    /// Entry Go file.
    #[arg(short = 'm', long)]
    entry: Option<Utf8PathBuf>,

    /// Debounce window in milliseconds.
    #[arg(short, long, value_name = "MS")]
    debounce: Option<u64>,

    /// Environment variables as KEY=VALUE (comma-separated).
    #[arg(short = 'v', long, value_delimiter = ',')]
    envs: Vec<String>,

    /// File with KEY=VALUE lines, loaded before --envs.
    #[arg(long = "env_file", visible_alias = "env")]
    env_file: Option<Utf8PathBuf>,

    /// Build flags passed to `go build` (comma-separated).
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    flags: Vec<String>,

    /// Arguments passed to the running program (comma-separated).
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    cli: Vec<String>,

    /// Config file to use instead of searching for gohot.yaml.
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Toolchain program used to build and run.
    #[arg(long, default_value = hot_supervisor::command::DEFAULT_TOOLCHAIN)]
    toolchain: String,
}

impl Overrides {
    /// Copies every value given on the command line into `config`.
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.path {
            config.path.clone_from(path);
        }
        if !self.ext.is_empty() {
            config.extensions.clone_from(&self.ext);
        }
        if !self.ignore.is_empty() {
            config.ignore.clone_from(&self.ignore);
        }
        if let Some(out) = &self.out {
            config.output.clone_from(out);
        }
        if let Some(entry) = &self.entry {
            config.entry = Some(entry.clone());
        }
        if let Some(debounce) = self.debounce {
            config.debounce_ms = debounce;
        }
        if !self.envs.is_empty() {
            config.envs.clone_from(&self.envs);
        }
        if let Some(env_file) = &self.env_file {
            config.env_file = Some(env_file.clone());
        }
        if !self.flags.is_empty() {
            config.flags.clone_from(&self.flags);
        }
        if !self.cli.is_empty() {
            config.cli.clone_from(&self.cli);
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins when set. Otherwise `debug` with `--verbose`, else `info`.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn,mio=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds the effective [`Config`]: defaults, then the config file, then
/// command-line overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded, the result fails
/// validation, or the env file cannot be read.
fn build_config(overrides: &Overrides) -> color_eyre::Result<Config> {
    let source = match &overrides.config {
        Some(path) if !path.is_file() => bail!("Config file not found: {path}"),
        Some(path) => Some(path.clone()),
        None => Config::discover(),
    };

    let mut config = match &source {
        Some(path) => {
            tracing::info!(path = %path, "Using config file");
            Config::load(path)?
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    overrides.apply(&mut config);
    config.normalize();
    config.validate().wrap_err("Invalid configuration")?;

    Ok(config.with_env_file()?)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Result of `gohot init`.
#[derive(Debug, PartialEq, Eq)]
enum InitOutcome {
    Created(Utf8PathBuf),
    Exists(Utf8PathBuf),
}

/// Writes the default config into `dir` unless one already exists.
fn init_config(dir: &Utf8Path) -> io::Result<InitOutcome> {
    if let Some(existing) = CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
    {
        return Ok(InitOutcome::Exists(existing));
    }

    let path = dir.join(CONFIG_FILE_NAMES[0]);
    std::fs::write(&path, DEFAULT_CONFIG_YAML)?;
    Ok(InitOutcome::Created(path))
}

/// Handles `gohot init`.
fn run_init() -> color_eyre::Result<()> {
    let outcome = init_config(Utf8Path::new(".")).wrap_err("Failed to write config file")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match outcome {
        InitOutcome::Created(path) => writeln!(handle, "Created {path}")?,
        InitOutcome::Exists(path) => writeln!(handle, "Config file already exists: {path}")?,
    }
    Ok(())
}

/// Handles `gohot version`.
fn run_version() -> color_eyre::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "gohot version {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

/// Handles the default command: watch, build, run, repeat.
async fn run_watch(overrides: &Overrides) -> color_eyre::Result<()> {
    let config = build_config(overrides)?;
    tracing::debug!(?config, "Effective configuration");

    Reloader::new(config)
        .with_toolchain(overrides.toolchain.clone())
        .run(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(error = %error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    match cli.command {
        Some(Commands::Init) => run_init(),
        Some(Commands::Version) => run_version(),
        None => run_watch(&cli.overrides).await,
    }
}
