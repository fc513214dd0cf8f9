//! Observability metrics for rate limiting.
//!
//! Provides counters about limiter behavior for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking rate limiting statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Cloning is cheap and clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total number of checks that were admitted
    checks_allowed: AtomicU64,
    /// Total number of checks rejected by a limit or block
    checks_blocked: AtomicU64,
    /// Total number of expired entries removed by sweeps
    entries_swept: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                checks_allowed: AtomicU64::new(0),
                checks_blocked: AtomicU64::new(0),
                entries_swept: AtomicU64::new(0),
            }),
        }
    }

    /// Record an admitted check.
    pub(crate) fn record_allowed(&self) {
        self.inner.checks_allowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected check.
    pub(crate) fn record_blocked(&self) {
        self.inner.checks_blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record entries removed by a sweep.
    pub(crate) fn record_swept(&self, count: usize) {
        self.inner
            .entries_swept
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get the total number of admitted checks.
    pub fn checks_allowed(&self) -> u64 {
        self.inner.checks_allowed.load(Ordering::Relaxed)
    }

    /// Get the total number of rejected checks.
    pub fn checks_blocked(&self) -> u64 {
        self.inner.checks_blocked.load(Ordering::Relaxed)
    }

    /// Get the total number of entries removed by sweeps.
    pub fn entries_swept(&self) -> u64 {
        self.inner.entries_swept.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_allowed: self.checks_allowed(),
            checks_blocked: self.checks_blocked(),
            entries_swept: self.entries_swept(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.checks_allowed.store(0, Ordering::Relaxed);
        self.inner.checks_blocked.store(0, Ordering::Relaxed);
        self.inner.entries_swept.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total number of checks that were admitted
    pub checks_allowed: u64,
    /// Total number of checks rejected by a limit or block
    pub checks_blocked: u64,
    /// Total number of expired entries removed by sweeps
    pub entries_swept: u64,
}

impl MetricsSnapshot {
    /// Get the total number of checks processed (allowed + blocked).
    pub fn total_checks(&self) -> u64 {
        self.checks_allowed.saturating_add(self.checks_blocked)
    }

    /// Calculate the block rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no checks have been processed.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_checks();
        if total == 0 {
            0.0
        } else {
            self.checks_blocked as f64 / total as f64
        }
    }
}
