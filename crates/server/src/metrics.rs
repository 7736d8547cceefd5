//! Prometheus metrics for the Airlift server.
//!
//! Process-level observability only; the product's per-release counters live
//! in the distributed metrics store.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Update checks answered, by the cache tier that supplied the response body
/// (`micro`, `distributed`, `storage`).
pub static UPDATE_CHECKS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "airlift_update_checks_total",
            "Update checks answered, by cache tier",
        ),
        &["tier"],
    )
    .expect("metric creation failed")
});

/// Distributed-cache failures degraded to misses on the read path.
pub static CACHE_READ_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "airlift_cache_read_errors_total",
        "Distributed cache read failures treated as misses",
    )
    .expect("metric creation failed")
});

/// Status reports accepted, by kind (`deploy`, `download`).
pub static REPORTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("airlift_reports_total", "Status reports accepted, by kind"),
        &["kind"],
    )
    .expect("metric creation failed")
});

/// Post-response metric dispatches that failed (logged only).
pub static METRICS_DISPATCH_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "airlift_metrics_dispatch_failures_total",
        "Counter updates that failed after the response was sent",
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPDATE_CHECKS_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CACHE_READ_ERRORS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(REPORTS_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(METRICS_DISPATCH_FAILURES.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // This would panic if any metric creation failed
        register_metrics();
        register_metrics();
    }
}
