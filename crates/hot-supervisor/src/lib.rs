//! Build-or-run supervision of a Go program.
//!
//! - [`LaunchPlan`] turns a [`Config`](hot_core::Config) into toolchain
//!   commands
//! - [`Supervisor`] owns the single child process and serializes
//!   stop-then-start transitions
//! - [`Reloader`] wires a [`TreeWatcher`](hot_watcher::TreeWatcher) and a
//!   [`Debouncer`](hot_watcher::Debouncer) to the supervisor
//!
//! # Usage
//!
//! ```no_run
//! use hot_core::Config;
//! use hot_supervisor::Reloader;
//!
//! # async fn example() -> Result<(), hot_supervisor::ReloadError> {
//! let config = Config::default();
//! config.validate().expect("valid configuration");
//!
//! Reloader::new(config)
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod entry;
pub mod error;
pub mod reload;
pub mod supervisor;

#[cfg(all(test, unix))]
mod test_support;

pub use command::{LaunchPlan, Strategy};
pub use entry::resolve_entry;
pub use error::{ReloadError, SupervisorError};
pub use reload::Reloader;
pub use supervisor::{InterpretReason, LaunchMode, Launched, Supervisor};
