//! Centralized logging setup
//!
//! Console output always; when file output is enabled, logs are also
//! written under the configured directory:
//! - <dir>/main - all events, JSON lines
//! - <dir>/error - WARN and ERROR only
//!
//! Event targets used by the crate: `pool`, `registry`, `queue`.

use crate::infrastructure::config::LoggingConfig;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging
///
/// Returns the WorkerGuards of the file appenders. They must be kept alive
/// for the duration of the program or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<Vec<WorkerGuard>> {
    let mut guards = Vec::new();

    let (main_layer, error_layer) = if config.file_output {
        let dir = config.directory.as_path();
        for log_type in ["main", "error"] {
            fs::create_dir_all(dir.join(log_type))?;
        }

        let (main_appender, main_guard) = create_appender(&dir.join("main"), "main");
        guards.push(main_guard);

        let (error_appender, error_guard) = create_appender(&dir.join("error"), "error");
        guards.push(error_guard);

        let main_layer = tracing_subscriber::fmt::layer()
            .with_writer(main_appender)
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .json();

        let error_layer = tracing_subscriber::fmt::layer()
            .with_writer(error_appender)
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

        (Some(main_layer), Some(error_layer))
    } else {
        (None, None)
    };

    // Console layer
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(main_layer)
        .with(error_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::info!(
        file_output = config.file_output,
        directory = %config.directory.display(),
        "Logging system initialized"
    );

    Ok(guards)
}

/// `RUST_LOG` wins over the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Create a daily rolling file appender
fn create_appender(dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, name);

    tracing_appender::non_blocking(appender)
}

/// Log macro helper for queue events
#[macro_export]
macro_rules! log_queue {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "queue", $level, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_creation() {
        let test_dir = Path::new("logs_test_instance_pool");
        if test_dir.exists() {
            fs::remove_dir_all(test_dir).ok();
        }

        fs::create_dir_all(test_dir.join("main")).unwrap();
        assert!(test_dir.join("main").exists());

        fs::remove_dir_all(test_dir).ok();
    }

    #[test]
    fn test_env_filter_falls_back_to_level() {
        let filter = env_filter("debug");
        // Whatever RUST_LOG says, a filter is always produced
        assert!(!filter.to_string().is_empty());
    }
}
