//! Shared fixtures: a scripted stand-in for the `go` toolchain.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use camino::Utf8PathBuf;
use hot_core::Config;
use tempfile::TempDir;

use crate::command::LaunchPlan;
use crate::entry::resolve_entry;
use crate::supervisor::Supervisor;

/// Behaves like `go build` / `go run` and appends one line per invocation
/// to `$FAKE_GO_LOG`. `$FAKE_GO_MODE` selects the failure mode.
const FAKE_GO: &str = r##"#!/bin/sh
log="$FAKE_GO_LOG"
cmd="$1"
shift
case "$cmd" in
  build)
    echo "build $*" >> "$log"
    case "$FAKE_GO_MODE" in
      missing) echo "go : unknown command" >&2; exit 1 ;;
      broken) echo "./main.go:3:1: syntax error: unexpected }" >&2; exit 2 ;;
    esac
    out=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then out="$2"; shift; fi
      shift
    done
    printf '#!/bin/sh\necho "artifact $$ $*" >> "%s"\nexec sleep 30\n' "$log" > "$out"
    chmod +x "$out"
    echo "built $out"
    ;;
  run)
    echo "run $$ $*" >> "$log"
    if [ "$FAKE_GO_MODE" = quick ]; then exit 0; fi
    exec sleep 30
    ;;
  *)
    echo "go $cmd: unknown command" >&2
    exit 2
    ;;
esac
"##;

const POLL: Duration = Duration::from_millis(20);
const PATIENCE: Duration = Duration::from_secs(10);

pub(crate) struct FakeToolchain {
    _dir: TempDir,
    pub(crate) root: Utf8PathBuf,
    pub(crate) script: Utf8PathBuf,
    pub(crate) log: Utf8PathBuf,
}

impl FakeToolchain {
    /// Creates `bin/go`, an empty log, and a project with `main.go` and
    /// a `vendor/` directory.
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 path");

        let root = base.join("project");
        fs::create_dir_all(root.join("vendor")).expect("create project");
        fs::write(root.join("main.go"), "package main\n").expect("write main.go");

        let bin = base.join("bin");
        fs::create_dir_all(&bin).expect("create bin");
        let script = bin.join("go");
        fs::write(&script, FAKE_GO).expect("write fake go");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");

        let log = base.join("go.log");
        fs::write(&log, "").expect("create log");

        Self {
            _dir: dir,
            root,
            script,
            log,
        }
    }

    pub(crate) fn entry(&self) -> Utf8PathBuf {
        self.root.join("main.go")
    }

    pub(crate) fn config(&self, mode: &str) -> Config {
        Config {
            path: self.root.clone(),
            extensions: vec![".go".to_owned()],
            ignore: vec![".git".to_owned(), "vendor".to_owned()],
            output: self.root.join("appb"),
            entry: None,
            debounce_ms: 100,
            envs: vec![
                format!("FAKE_GO_MODE={mode}"),
                format!("FAKE_GO_LOG={}", self.log),
            ],
            env_file: None,
            flags: Vec::new(),
            cli: vec!["--port".to_owned(), "8080".to_owned()],
        }
    }

    pub(crate) fn supervisor(&self, config: &Config, parallelism: usize) -> Supervisor {
        let entry = resolve_entry(&config.path, config.entry.as_deref()).expect("entry");
        let plan = LaunchPlan::new(config, entry).with_toolchain(self.script.as_str());
        Supervisor::new(plan).with_parallelism(parallelism)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .expect("read log")
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    /// Waits until at least `n` lines start with `prefix`.
    pub(crate) async fn wait_for_count(&self, prefix: &str, n: usize) {
        let deadline = std::time::Instant::now() + PATIENCE;
        while self.count(prefix) < n {
            assert!(
                std::time::Instant::now() < deadline,
                "timed out waiting for {n} '{prefix}' lines: {:?}",
                self.lines()
            );
            tokio::time::sleep(POLL).await;
        }
    }

    /// Waits for the first line starting with `prefix` and returns it.
    pub(crate) async fn wait_for_line(&self, prefix: &str) -> String {
        self.wait_for_count(prefix, 1).await;
        self.lines()
            .into_iter()
            .find(|l| l.starts_with(prefix))
            .expect("line present")
    }
}

/// Returns `true` if a process with `pid` exists.
pub(crate) fn is_alive(pid: u32) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -0 {pid} 2>/dev/null"))
        .status()
        .is_ok_and(|status| status.success())
}
