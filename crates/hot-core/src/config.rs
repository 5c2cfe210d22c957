//! Configuration for the gohot reload loop.
//!
//! [`Config`] is the single value the watch loop consumes. It is built in
//! three layers, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A YAML file (`gohot.yaml` / `gohot.yml`, see [`Config::discover`])
//! 3. Command-line flags (applied by the binary)
//!
//! After layering, call [`Config::normalize`], then [`Config::validate`], then
//! [`Config::with_env_file`] before handing the value to the supervisor.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Suffix every entry file must carry.
pub const SOURCE_SUFFIX: &str = ".go";

/// Conventional entry file name looked up directly under the watched root.
pub const DEFAULT_ENTRY: &str = "main.go";

/// Config file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &["gohot.yaml", "gohot.yml"];

/// Directory under `$HOME` searched after the working directory.
pub const HOME_CONFIG_DIR: &str = ".gohot";

/// Contents written by `gohot init`.
pub const DEFAULT_CONFIG_YAML: &str = r#"path: "./"
ext:
  - .go
  - .yaml
ignore:
  - .git
  - vendor
out: ./appb
entry: main.go
debounce: 500
envs: []
env_file:
flags: []
cli: []
"#;

/// Root configuration for a gohot session.
///
/// Field names in the YAML file follow the flag names (`ext`, `out`), so the
/// struct renames a few of them.
///
/// # Examples
///
/// ```
/// use hot_core::Config;
/// use std::time::Duration;
///
/// let config = Config::default();
/// assert_eq!(config.extensions, vec![".go", ".yaml"]);
/// assert_eq!(config.debounce(), Duration::from_millis(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory to watch.
    pub path: Utf8PathBuf,

    /// Filename suffixes that trigger a rebuild (e.g. `.go`).
    #[serde(rename = "ext", deserialize_with = "string_list")]
    pub extensions: Vec<String>,

    /// Directory names or root-relative paths excluded from watching.
    #[serde(deserialize_with = "string_list")]
    pub ignore: Vec<String>,

    /// Path of the compiled artifact.
    #[serde(rename = "out")]
    pub output: Utf8PathBuf,

    /// Explicit entry file. `None` means `<path>/main.go`.
    pub entry: Option<Utf8PathBuf>,

    /// Quiet period in milliseconds before a rebuild fires.
    #[serde(rename = "debounce")]
    pub debounce_ms: u64,

    /// Extra `KEY=VALUE` environment entries for the build and the child.
    #[serde(deserialize_with = "string_list")]
    pub envs: Vec<String>,

    /// Optional dotenv file loaded before `envs`.
    pub env_file: Option<Utf8PathBuf>,

    /// Flags passed to `go build`.
    #[serde(deserialize_with = "string_list")]
    pub flags: Vec<String>,

    /// Arguments passed to the running program.
    #[serde(deserialize_with = "string_list")]
    pub cli: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: Utf8PathBuf::from("./"),
            extensions: vec![".go".to_owned(), ".yaml".to_owned()],
            ignore: vec![".git".to_owned(), "vendor".to_owned()],
            output: Utf8PathBuf::from("./appb"),
            entry: Some(Utf8PathBuf::from(DEFAULT_ENTRY)),
            debounce_ms: 1000,
            envs: Vec::new(),
            env_file: None,
            flags: Vec::new(),
            cli: Vec::new(),
        }
    }
}

/// Accepts a missing list, `null`, and `null` items (`envs:\n  -\n`).
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

impl Config {
    /// Returns the debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Loads a configuration from a YAML file.
    ///
    /// Keys missing from the file keep their default values; unknown keys
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid YAML for this schema.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parses a configuration from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Finds the config file to load, if any.
    ///
    /// Looks for `gohot.yaml` then `gohot.yml` in the working directory,
    /// then in `$HOME/.gohot/`.
    pub fn discover() -> Option<Utf8PathBuf> {
        let home = dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok());
        Self::discover_in(Utf8Path::new("."), home.as_deref())
    }

    /// Like [`Config::discover`] with explicit search roots.
    pub fn discover_in(cwd: &Utf8Path, home: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        let home_dir = home.map(|h| h.join(HOME_CONFIG_DIR));
        std::iter::once(cwd.to_owned())
            .chain(home_dir)
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    /// Trims every string option and drops blank entries.
    ///
    /// Empty `entry` and `env_file` values become `None`. Extension format
    /// is left to [`Config::validate`].
    pub fn normalize(&mut self) {
        for list in [
            &mut self.extensions,
            &mut self.ignore,
            &mut self.envs,
            &mut self.flags,
            &mut self.cli,
        ] {
            list.retain_mut(|item| {
                let trimmed = item.trim();
                if trimmed.len() != item.len() {
                    *item = trimmed.to_owned();
                }
                !item.is_empty()
            });
        }

        for path in [&mut self.entry, &mut self.env_file] {
            if path.as_ref().is_some_and(|p| p.as_str().trim().is_empty()) {
                *path = None;
            }
        }
    }

    /// Loads `env_file`, placing its entries before `envs`.
    ///
    /// Later entries win for duplicate keys, so explicit `envs` override the
    /// file. The `env_file` field is cleared once loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvFile`] if the file cannot be read or parsed.
    pub fn with_env_file(mut self) -> Result<Self, ConfigError> {
        let Some(path) = self.env_file.take() else {
            return Ok(self);
        };

        let to_error = |source| ConfigError::EnvFile {
            path: path.clone(),
            source,
        };

        let mut entries = Vec::new();
        for item in dotenvy::from_path_iter(path.as_std_path()).map_err(to_error)? {
            let (key, value) = item.map_err(to_error)?;
            entries.push(format!("{key}={value}"));
        }

        tracing::debug!(path = %path, count = entries.len(), "Loaded env file");
        entries.append(&mut self.envs);
        self.envs = entries;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir is UTF-8")
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.path, "./");
        assert_eq!(config.ignore, vec![".git", "vendor"]);
        assert_eq!(config.output, "./appb");
        assert_eq!(config.entry.as_deref(), Some(Utf8Path::new("main.go")));
        assert_eq!(config.debounce_ms, 1000);
        assert!(config.envs.is_empty());
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let config = Config::from_yaml("debounce: 250\next: [.go]\n").expect("valid yaml");
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.extensions, vec![".go"]);
        // Other fields keep their defaults
        assert_eq!(config.output, "./appb");
        assert_eq!(config.ignore, vec![".git", "vendor"]);
    }

    #[test]
    fn test_config_accepts_blank_list_items() {
        let yaml = "envs:\n -\nflags:\n -\ncli:\nentry:\n";
        let config = Config::from_yaml(yaml).expect("valid yaml");
        assert!(config.envs.is_empty());
        assert!(config.flags.is_empty());
        assert!(config.cli.is_empty());
        assert_eq!(config.entry, None);
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::from_yaml(DEFAULT_CONFIG_YAML).expect("template parses");
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.extensions, vec![".go", ".yaml"]);
        assert_eq!(config.env_file, None);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_yaml("  \n").expect("empty ok"), Config::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().expect("temp dir");
        let file = utf8(&dir).join("gohot.yaml");
        fs::write(&file, "debounce: [not, a, number]\n").expect("write config");

        let err = Config::load(&file).expect_err("invalid debounce");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Utf8Path::new("/definitely/not/here.yaml")).expect_err("missing");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_discover_prefers_working_directory_yaml() {
        let cwd = TempDir::new().expect("temp dir");
        let home = TempDir::new().expect("temp dir");
        let cwd_path = utf8(&cwd);
        let home_path = utf8(&home);

        fs::create_dir(home_path.join(HOME_CONFIG_DIR)).expect("mkdir");
        fs::write(home_path.join(".gohot/gohot.yaml"), "").expect("write");
        assert_eq!(
            Config::discover_in(&cwd_path, Some(&home_path)),
            Some(home_path.join(".gohot/gohot.yaml"))
        );

        fs::write(cwd_path.join("gohot.yml"), "").expect("write");
        assert_eq!(
            Config::discover_in(&cwd_path, Some(&home_path)),
            Some(cwd_path.join("gohot.yml"))
        );

        fs::write(cwd_path.join("gohot.yaml"), "").expect("write");
        assert_eq!(
            Config::discover_in(&cwd_path, Some(&home_path)),
            Some(cwd_path.join("gohot.yaml"))
        );
    }

    #[test]
    fn test_discover_none() {
        let cwd = TempDir::new().expect("temp dir");
        assert_eq!(Config::discover_in(&utf8(&cwd), None), None);
    }

    #[test]
    fn test_normalize_trims_and_drops_blanks() {
        let mut config = Config {
            extensions: vec![" .go ".to_owned(), String::new()],
            flags: vec!["  ".to_owned(), "race".to_owned()],
            cli: vec![" --port=8080".to_owned()],
            entry: Some(Utf8PathBuf::from("")),
            env_file: Some(Utf8PathBuf::from(" ")),
            ..Config::default()
        };
        config.normalize();

        assert_eq!(config.extensions, vec![".go"]);
        assert_eq!(config.flags, vec!["race"]);
        assert_eq!(config.cli, vec!["--port=8080"]);
        assert_eq!(config.entry, None);
        assert_eq!(config.env_file, None);
    }

    #[test]
    fn test_env_file_entries_precede_envs() {
        let dir = TempDir::new().expect("temp dir");
        let env_path = utf8(&dir).join(".env");
        fs::write(
            &env_path,
            "# comment\nexport PORT=8080\nNAME=\"from file\"\nMODE=dev\n",
        )
        .expect("write env");

        let config = Config {
            envs: vec!["MODE=prod".to_owned()],
            env_file: Some(env_path),
            ..Config::default()
        }
        .with_env_file()
        .expect("env file loads");

        assert_eq!(
            config.envs,
            vec!["PORT=8080", "NAME=from file", "MODE=dev", "MODE=prod"]
        );
        assert_eq!(config.env_file, None);
    }

    #[test]
    fn test_env_file_missing() {
        let config = Config {
            env_file: Some(Utf8PathBuf::from("/no/such/.env")),
            ..Config::default()
        };
        assert!(matches!(
            config.with_env_file(),
            Err(ConfigError::EnvFile { .. })
        ));
    }
}
