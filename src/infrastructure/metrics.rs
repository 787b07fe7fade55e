//! Metrics collection for pool monitoring
//!
//! Lock-free counters using atomic operations.
//! Updated on every pool operation, exported as snapshots.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Pool metrics collector
///
/// Thread-safe counters updated by pool operations.
/// Snapshots taken for export.
#[derive(Debug)]
pub struct PoolMetrics {
    /// Total successful `get` calls
    gets: AtomicU64,
    /// `get` calls served by an inactive member
    reuses: AtomicU64,
    /// `get` calls that had to create a new member
    overflow_creates: AtomicU64,
    /// Members created by prewarm
    prewarmed: AtomicU64,
    /// Returns that flipped an active member to inactive
    returns: AtomicU64,
    /// Returns of members that were already inactive
    double_returns: AtomicU64,
    /// Foreign instances adopted on return
    adoptions: AtomicU64,
    /// Returns rejected because no instance was given
    rejected_returns: AtomicU64,
    /// Operations that failed for lack of a factory
    configuration_errors: AtomicU64,
    /// Creation time for uptime calculation
    start_time: Instant,
}

/// Metrics snapshot for export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub gets: u64,
    pub reuses: u64,
    pub overflow_creates: u64,
    pub prewarmed: u64,
    pub returns: u64,
    pub double_returns: u64,
    pub adoptions: u64,
    pub rejected_returns: u64,
    pub configuration_errors: u64,
    pub uptime_seconds: u64,
}

impl PoolMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            gets: AtomicU64::new(0),
            reuses: AtomicU64::new(0),
            overflow_creates: AtomicU64::new(0),
            prewarmed: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            double_returns: AtomicU64::new(0),
            adoptions: AtomicU64::new(0),
            rejected_returns: AtomicU64::new(0),
            configuration_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a `get` served from an inactive member
    #[inline]
    pub fn record_reuse(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.reuses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a `get` that grew the pool
    #[inline]
    pub fn record_overflow(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.overflow_creates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_prewarm(&self, count: usize) {
        self.prewarmed.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_return(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_double_return(&self) {
        self.double_returns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_adoption(&self) {
        self.adoptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected_return(&self) {
        self.rejected_returns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_configuration_error(&self) {
        self.configuration_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            overflow_creates: self.overflow_creates.load(Ordering::Relaxed),
            prewarmed: self.prewarmed.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            double_returns: self.double_returns.load(Ordering::Relaxed),
            adoptions: self.adoptions.load(Ordering::Relaxed),
            rejected_returns: self.rejected_returns.load(Ordering::Relaxed),
            configuration_errors: self.configuration_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Ratio of gets served without creating a member (0.0 when idle)
    pub fn reuse_ratio(&self) -> f64 {
        let gets = self.gets.load(Ordering::Relaxed);
        if gets == 0 {
            return 0.0;
        }
        self.reuses.load(Ordering::Relaxed) as f64 / gets as f64
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = PoolMetrics::new();
        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.gets, 0);
        assert_eq!(snapshot.adoptions, 0);
        assert_eq!(metrics.reuse_ratio(), 0.0);
    }

    #[test]
    fn test_record_gets() {
        let metrics = PoolMetrics::new();

        metrics.record_reuse();
        metrics.record_reuse();
        metrics.record_reuse();
        metrics.record_overflow();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.gets, 4);
        assert_eq!(snapshot.reuses, 3);
        assert_eq!(snapshot.overflow_creates, 1);
        assert_eq!(metrics.reuse_ratio(), 0.75);
    }

    #[test]
    fn test_record_returns() {
        let metrics = PoolMetrics::new();

        metrics.record_prewarm(5);
        metrics.record_return();
        metrics.record_double_return();
        metrics.record_adoption();
        metrics.record_rejected_return();
        metrics.record_configuration_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.prewarmed, 5);
        assert_eq!(snapshot.returns, 1);
        assert_eq!(snapshot.double_returns, 1);
        assert_eq!(snapshot.adoptions, 1);
        assert_eq!(snapshot.rejected_returns, 1);
        assert_eq!(snapshot.configuration_errors, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = PoolMetrics::new();
        metrics.record_overflow();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["gets"], 1);
        assert_eq!(json["overflow_creates"], 1);
    }
}
