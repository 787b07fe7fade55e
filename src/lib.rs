//! Reusable instance pools
//!
//! Core library: a pool that prewarms, grows one member at a time on
//! exhaustion and adopts instances it never created, plus a named pool
//! registry and a sequential request queue for setup work.

pub mod infrastructure;
pub mod pool;
pub mod queue;

// Re-export commonly used types
pub use infrastructure::config::{Config, ConfigError, LoggingConfig, PoolConfig, PoolEntry};
pub use pool::{
    Factory, Instance, InstancePool, PoolError, PoolRegistry, PoolStats, ReleaseOutcome,
    SetupOutcome, SetupReport,
};
pub use queue::{DrainSummary, QueuePhase, RequestQueue, Step};

use thiserror::Error;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration file error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        fn load(text: &str) -> Result<Config> {
            Ok(Config::from_toml_str(text)?)
        }

        let err = load("[pool]\nbuffer_size = -1").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
        assert!(err.to_string().starts_with("Configuration file error"));
    }
}
