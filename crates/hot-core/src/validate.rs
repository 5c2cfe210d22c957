//! Structural validation of a [`Config`].
//!
//! Validation runs once, before the watcher or the supervisor is created.
//! The first violation found is reported.

use crate::config::{Config, SOURCE_SUFFIX};
use crate::error::ConfigError;

impl Config {
    /// Checks the configuration before the loop starts.
    ///
    /// Rejects a missing or non-directory `path`, an empty or malformed
    /// extension list, a zero debounce, an empty `output` or one that names
    /// an existing directory, an `entry` that is missing or not a `.go`
    /// file, and an `env_file` that does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use hot_core::Config;
    ///
    /// let config = Config {
    ///     path: "/definitely/not/here".into(),
    ///     ..Config::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.path.is_dir() {
            return Err(ConfigError::invalid_path(
                &self.path,
                "watch path must be an existing directory",
            ));
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::invalid_option(
                "ext",
                "no file extensions specified",
            ));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| !ext.trim().starts_with('.'))
        {
            return Err(ConfigError::invalid_option(
                "ext",
                format!("invalid extension format: {ext} (must start with a dot)"),
            ));
        }

        if self.debounce_ms == 0 {
            return Err(ConfigError::invalid_option("debounce", "must be > 0"));
        }

        if self.output.as_str().is_empty() {
            return Err(ConfigError::invalid_option(
                "out",
                "output binary path is required",
            ));
        }
        if self.output.is_dir() {
            return Err(ConfigError::invalid_path(
                &self.output,
                "output path is a directory",
            ));
        }

        if let Some(entry) = self.entry.as_deref().filter(|e| !e.as_str().is_empty()) {
            if !entry.exists() {
                return Err(ConfigError::MissingFile(entry.to_owned()));
            }
            if !entry.as_str().ends_with(SOURCE_SUFFIX) {
                return Err(ConfigError::invalid_path(
                    entry,
                    format!("entry file must be a {SOURCE_SUFFIX} file"),
                ));
            }
        }

        if let Some(env_file) = &self.env_file {
            if !env_file.is_file() {
                return Err(ConfigError::MissingFile(env_file.clone()));
            }
        }

        Ok(())
    }
}
