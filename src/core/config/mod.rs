//! core::config
//!
//! Guard policy configuration schema and loading.
//!
//! # Precedence
//!
//! Policy values are resolved in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Config file
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. Explicit path passed by the caller
//! 2. `$PLANLOOM_CONFIG` if set
//! 3. `<config dir>/planloom/guard.toml`
//!
//! A missing file is not an error; defaults apply. A present but malformed
//! file is an error, never silently ignored.

pub mod schema;

pub use schema::{FsGuardConfig, GuardConfig, NetGuardConfig, ShellGuardConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// The default config file path, if a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("planloom").join("guard.toml"))
}

impl GuardConfig {
    /// Load the guard policy.
    ///
    /// `explicit` takes precedence over `$PLANLOOM_CONFIG`, which takes
    /// precedence over the default location. Returns defaults when no file
    /// is found.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a file exists but cannot be read, parsed,
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PLANLOOM_CONFIG").map(PathBuf::from))
            .or_else(default_config_path);

        let path = match candidate {
            Some(path) if path.exists() => path,
            _ => return Ok(Self::default()),
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;
        let config: GuardConfig =
            toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}
