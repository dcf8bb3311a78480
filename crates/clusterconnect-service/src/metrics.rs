//! Metrics for the project service.
//!
//! Counters are emitted through the `metrics` facade; without an installed
//! recorder they are no-ops. Cache error counters are the degradation signal
//! for an unhealthy cache backend, since cache failures never reach callers.

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    // Cache metrics
    pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
    pub const CACHE_ERRORS_TOTAL: &str = "cache_errors_total";
    pub const CACHE_ENTRIES: &str = "cache_entries";

    // Store metrics
    pub const STORE_OPERATIONS_TOTAL: &str = "store_operations_total";
}

/// Record a cache hit.
pub fn record_cache_hit(backend: &str) {
    counter!(names::CACHE_HITS_TOTAL, "backend" => backend.to_string()).increment(1);
}

/// Record a cache miss.
pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}

/// Record a failed or timed-out cache operation, or an undecodable value.
pub fn record_cache_error(op: &'static str) {
    counter!(names::CACHE_ERRORS_TOTAL, "op" => op).increment(1);
}

/// Set the number of in-process cache entries.
pub fn set_cache_entries(count: usize) {
    gauge!(names::CACHE_ENTRIES).set(count as f64);
}

/// Record the outcome of a store operation.
pub fn record_store_operation(op: &'static str, outcome: &'static str) {
    counter!(
        names::STORE_OPERATIONS_TOTAL,
        "op" => op,
        "outcome" => outcome
    )
    .increment(1);
}
