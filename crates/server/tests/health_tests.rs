//! Integration tests for the health endpoint.

mod common;

use airlift_cache::RedisManager;
use airlift_core::config::AppConfig;
use airlift_server::{AppState, create_router};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestServer;
use tower::ServiceExt;

async fn get_health(router: &axum::Router) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).to_string())
}

#[tokio::test]
async fn healthy_when_storage_and_cache_respond() {
    let server = TestServer::new();
    let (status, body) = get_health(&server.router).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Healthy");
}

#[tokio::test]
async fn unhealthy_when_the_deployments_document_breaks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployments.json");
    tokio::fs::write(&path, "{\"deployments\":{}}").await.unwrap();

    let storage = airlift_storage::from_config(&airlift_core::config::StorageConfig::Filesystem {
        path: path.clone(),
    })
    .await
    .unwrap();
    let state = AppState::new(AppConfig::for_testing(), storage, RedisManager::disabled());
    let router = create_router(state);

    let (status, _) = get_health(&router).await;
    assert_eq!(status, StatusCode::OK);

    tokio::fs::write(&path, "not json").await.unwrap();
    let (status, body) = get_health(&router).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Storage unhealthy");
}

#[tokio::test]
async fn metrics_endpoint_is_served_when_enabled() {
    let server = TestServer::new();
    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_endpoint_is_absent_when_disabled() {
    let mut config = AppConfig::for_testing();
    config.server.metrics_enabled = false;
    let server = TestServer::with_config(config);

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
