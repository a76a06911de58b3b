//! Parsing and validation of `rivet.toml` system configuration files.
//!
//! This crate reads the configuration that accompanies a compilation (the
//! system name, output directory handed to the backend, default clock and
//! reset port names, and lint levels) and produces a strongly-typed
//! [`SystemConfig`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
