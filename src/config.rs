/// Application configuration loader - parses sublime.toml
///
/// Keeps deployment details (feed environment, snapshot export, favorites
/// archive location) out of the code so the same binary runs against
/// development and production data.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "sublime.toml";

/// Environment variable that overrides `DEFAULT_CONFIG_PATH`.
pub const CONFIG_PATH_ENV: &str = "SUBLIME_CONFIG";

/// Feed environment the app is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Qa,
    Stage,
    Production,
}

/// Settings loaded from sublime.toml
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,

    /// Base URL of the hydrology data publisher.
    pub base_url: String,

    /// JSON snapshot to serve; the bundled snapshot when unset.
    pub snapshot_path: Option<PathBuf>,

    /// Where favorite station codes are archived; in-memory when unset.
    pub favorites_path: Option<PathBuf>,

    /// History span in days used when a request does not name one
    /// (0, 1, 7 or 30).
    pub default_span_days: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            base_url: "https://arso.gov.si".to_string(),
            snapshot_path: None,
            favorites_path: None,
            default_span_days: 30,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads configuration from `path`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads configuration from `path`, or defaults when the file does not exist.
/// A file that exists but cannot be read or parsed is still an error.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}
