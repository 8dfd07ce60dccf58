/// Metrics and telemetry for Pocketledger
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Operation counts, outcomes and latencies
/// - Slow operations
/// - Cache hit/miss rates and invalidations
/// - Authorization denials
/// - Captcha verification outcomes

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // ========== Operation Metrics ==========

    /// Total operations by name and outcome
    pub static ref OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_operations_total",
        "Total number of pipeline operations executed",
        &["operation", "outcome"]
    )
    .unwrap();

    /// Operation duration in seconds
    pub static ref OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "ledger_operation_duration_seconds",
        "Operation latencies in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Operations that exceeded their slow threshold
    pub static ref SLOW_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_slow_operations_total",
        "Total number of operations slower than their threshold",
        &["operation"]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    /// Cache hits by operation
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_cache_hits_total",
        "Total number of cache hits",
        &["operation"]
    )
    .unwrap();

    /// Cache misses by operation
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_cache_misses_total",
        "Total number of cache misses",
        &["operation"]
    )
    .unwrap();

    /// Keys removed by pattern invalidation
    pub static ref CACHE_INVALIDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_cache_invalidations_total",
        "Total number of cache keys removed by pattern",
        &["pattern"]
    )
    .unwrap();

    // ========== Security Metrics ==========

    /// Authorization denials by operation
    pub static ref AUTHORIZATION_DENIALS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_authorization_denials_total",
        "Total number of calls rejected by the authorization gate",
        &["operation"]
    )
    .unwrap();

    /// Captcha verifications by outcome
    pub static ref CAPTCHA_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_captcha_verifications_total",
        "Total number of remote captcha verifications",
        &["outcome"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a finished operation
pub fn record_operation(operation: &str, success: bool, duration: f64) {
    OPERATIONS_TOTAL
        .with_label_values(&[operation, if success { "success" } else { "failure" }])
        .inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);
}

/// Record an operation that exceeded its slow threshold
pub fn record_slow_operation(operation: &str) {
    SLOW_OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
}

/// Record a cache access
pub fn record_cache_access(operation: &str, hit: bool) {
    if hit {
        CACHE_HITS_TOTAL.with_label_values(&[operation]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[operation]).inc();
    }
}

/// Record keys removed by a pattern invalidation
pub fn record_cache_invalidation(pattern: &str, removed: usize) {
    CACHE_INVALIDATIONS_TOTAL
        .with_label_values(&[pattern])
        .inc_by(removed as u64);
}

/// Record an authorization denial
pub fn record_authorization_denial(operation: &str) {
    AUTHORIZATION_DENIALS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Record a captcha verification outcome
pub fn record_captcha_verification(outcome: &str) {
    CAPTCHA_VERIFICATIONS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}
