//! Health endpoint.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET /health - storage + cache health check.
///
/// Intentionally unauthenticated for load balancers and probes. Answers
/// `200 "Healthy"` only when both the release-history backend and (when
/// enabled) the distributed cache respond.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.storage.health_check().await {
        tracing::error!(error = %e, "storage health check failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Storage unhealthy");
    }
    if let Err(e) = state.redis.health_check().await {
        tracing::error!(error = %e, "cache health check failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Cache unhealthy");
    }
    (StatusCode::OK, "Healthy")
}
