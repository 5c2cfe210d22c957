//! Core configuration and errors for gohot.
//!
//! This crate provides the foundational pieces shared across the workspace:
//!
//! - [`Config`], the single value the reload loop consumes
//! - YAML loading, discovery, and env-file merging
//! - Structural validation ([`Config::validate`])
//! - [`ConfigError`] for everything that can go wrong before the loop starts

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
mod validate;

pub use config::{
    CONFIG_FILE_NAMES, Config, DEFAULT_CONFIG_YAML, DEFAULT_ENTRY, HOME_CONFIG_DIR, SOURCE_SUFFIX,
};
pub use error::ConfigError;
