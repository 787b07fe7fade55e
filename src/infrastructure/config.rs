//! Configuration management
//!
//! Loads configuration from config.toml at startup.
//! Every value has a default, so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
///
/// Loaded from config.toml at startup (or the file named by `CONFIG_PATH`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Pool setup
    #[serde(default)]
    pub pool: PoolConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pool setup configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Size in bytes of each buffer handed out by the binary's pools
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Pools to create and prewarm, in order
    #[serde(default = "default_entries")]
    pub entries: Vec<PoolEntry>,
}

/// One named pool to prewarm
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PoolEntry {
    pub name: String,

    /// Inactive members to create up front
    #[serde(default = "default_prewarm")]
    pub prewarm: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Write log files in addition to the console
    #[serde(default = "default_file_output")]
    pub file_output: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            entries: default_entries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_log_directory(),
            file_output: default_file_output(),
        }
    }
}

fn default_buffer_size() -> usize {
    1024
}

fn default_prewarm() -> usize {
    5
}

fn default_entries() -> Vec<PoolEntry> {
    ["ramp", "lever", "domino"]
        .into_iter()
        .map(|name| PoolEntry {
            name: name.to_string(),
            prewarm: default_prewarm(),
        })
        .collect()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_output() -> bool {
    true
}

impl Config {
    /// Load configuration from config.toml file
    ///
    /// `CONFIG_PATH` overrides the file location.
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File not found - use defaults
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading file
    IoError(std::io::Error),
    /// Parse error (invalid TOML)
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::ParseError(_) => None,
        }
    }
}
