//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health check (intentionally unauthenticated for load balancers/probes)
        .route("/health", get(handlers::health_check))
        // Legacy-shape acquisition surface
        .route("/updateCheck", get(handlers::update_check_legacy))
        .route("/reportStatus/deploy", post(handlers::report_deploy))
        .route("/reportStatus/download", post(handlers::report_download))
        // New-shape acquisition surface
        .route(
            "/v0.1/public/codepush/update_check",
            get(handlers::update_check_v1),
        )
        .route(
            "/v0.1/public/codepush/report_status/deploy",
            post(handlers::report_deploy),
        )
        .route(
            "/v0.1/public/codepush/report_status/download",
            post(handlers::report_download),
        );

    // Conditionally add the Prometheus endpoint based on config.
    // When enabled, restrict it to authorized scraper IPs at the
    // infrastructure level.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
