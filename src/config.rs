//! Configuration for the `tagsearch` binary.
//!
//! Stored in TOML format at `~/.config/tagsearch/config.toml` (or the XDG
//! equivalent). Everything is optional; command-line flags win over the file.
//!
//! # Example Configuration
//!
//! ```toml
//! # Database location (defaults to the platform data dir)
//! db = "/home/user/.local/share/tagsearch/tags.db"
//!
//! # Restrict searches to exact tag matches by default
//! strict = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database location override.
    #[serde(default)]
    pub db: Option<PathBuf>,

    /// Default strict-match setting for searches.
    #[serde(default)]
    pub strict: bool,
}

impl Config {
    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(default_config_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&raw)?)
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dirs = directories::ProjectDirs::from("com", "tagsearch", "tagsearch")
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("config.toml"))
}
