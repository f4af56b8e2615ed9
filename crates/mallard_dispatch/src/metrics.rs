//! In-process counters for dispatch decisions and outcomes.
//!
//! These metrics are intentionally lightweight and lock-free so they can be
//! updated on the per-statement hot path without noticeable overhead.

use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated counters for execution-path selection and results.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Number of prepared-path attempts started.
    prepared_attempts: AtomicU64,
    /// Number of prepared-path attempts that produced a result.
    prepared_successes: AtomicU64,
    /// Number of prepare rejections that reclassified a statement shape.
    prepare_unsupported: AtomicU64,
    /// Number of direct executions entered as fallback after a rejection.
    fallback_executions: AtomicU64,
    /// Number of direct executions, fallbacks and short-circuits combined.
    direct_executions: AtomicU64,
    /// Number of cache lookups that returned a learned decision.
    cache_hits: AtomicU64,
    /// Number of cache lookups for unseen fingerprints.
    cache_misses: AtomicU64,
    /// Number of full cache invalidations from observed DDL.
    cache_invalidations: AtomicU64,
    /// Number of parameter-binding failures surfaced to callers.
    binding_errors: AtomicU64,
    /// Number of dispatches that ended in any surfaced error.
    terminal_failures: AtomicU64,
}

impl DispatchMetrics {
    pub fn record_prepared_attempt(&self) {
        self.prepared_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prepared_success(&self) {
        self.prepared_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prepare_unsupported(&self) {
        self.prepare_unsupported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_execution(&self) {
        self.fallback_executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_direct_execution(&self) {
        self.direct_executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_invalidation(&self) {
        self.cache_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_binding_error(&self) {
        self.binding_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_terminal_failure(&self) {
        self.terminal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            prepared_attempts: self.prepared_attempts.load(Ordering::Relaxed),
            prepared_successes: self.prepared_successes.load(Ordering::Relaxed),
            prepare_unsupported: self.prepare_unsupported.load(Ordering::Relaxed),
            fallback_executions: self.fallback_executions.load(Ordering::Relaxed),
            direct_executions: self.direct_executions.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_invalidations: self.cache_invalidations.load(Ordering::Relaxed),
            binding_errors: self.binding_errors.load(Ordering::Relaxed),
            terminal_failures: self.terminal_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot view of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchMetricsSnapshot {
    /// Number of prepared-path attempts started.
    pub prepared_attempts: u64,
    /// Number of prepared-path attempts that produced a result.
    pub prepared_successes: u64,
    /// Number of prepare rejections that reclassified a statement shape.
    pub prepare_unsupported: u64,
    /// Number of direct executions entered as fallback.
    pub fallback_executions: u64,
    /// Number of direct executions overall.
    pub direct_executions: u64,
    /// Number of cache hits.
    pub cache_hits: u64,
    /// Number of cache misses.
    pub cache_misses: u64,
    /// Number of full cache invalidations.
    pub cache_invalidations: u64,
    /// Number of parameter-binding failures.
    pub binding_errors: u64,
    /// Number of dispatches that surfaced an error.
    pub terminal_failures: u64,
}
