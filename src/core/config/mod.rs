//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! 1. Default values
//! 2. `glyphsync.toml` in the working directory (when present)
//! 3. An explicit `--config` path (must exist; overrides the search)
//!
//! CLI flags are not handled here.

pub mod schema;

pub use schema::{AxisConfig, AxisValueConfig, FetchConfig, ReconcileConfig, SourceConfig, SyncConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::variants::SpaceError;

/// Canonical config file name searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "glyphsync.toml";

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

    #[error("invalid axis configuration: {0}")]
    Space(#[from] SpaceError),
}

impl SyncConfig {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist and parse. Without one,
    /// `glyphsync.toml` under `cwd` is used when present; otherwise stock
    /// defaults apply. The result is always validated.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::read_file(path)?,
            None => {
                let candidate = cwd.join(CONFIG_FILE_NAME);
                if candidate.exists() {
                    Self::read_file(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
