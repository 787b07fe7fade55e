//! Infrastructure - everything around the pools themselves
//!
//! - Configuration management
//! - Logging
//! - Metrics

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use metrics::{MetricsSnapshot, PoolMetrics};
