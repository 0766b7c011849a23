use crate::schema::{ConfigError, ValidationResult, validate};
use crate::types::Config;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "boomerang.json";

/// Error type for config loading operations.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Config { path: PathBuf, source: ConfigError },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, .. } => write!(f, "failed to read config [{}]", path.display()),
            LoadError::Config { path, .. } => write!(f, "invalid config [{}]", path.display()),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Config { source, .. } => Some(source),
        }
    }
}

/// Loads config from a string.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or fails schema validation.
pub fn load_from_str(s: &str) -> Result<Config, ConfigError> {
    s.parse()
}

/// Loads config from a specific path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the config is invalid.
pub fn load_from_path(path: &Path) -> Result<Config, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|source| LoadError::Config {
        path: path.to_path_buf(),
        source,
    })
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s).map_err(ConfigError::InvalidJson)?;

        if let ValidationResult::Invalid(errors) = validate(&value) {
            return Err(ConfigError::ValidationFailed(errors));
        }

        serde_json::from_value(value).map_err(ConfigError::InvalidJson)
    }
}
