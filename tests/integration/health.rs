//! Health endpoint integration tests
//!
//! Tests for the public endpoints:
//! - GET /health - Full health check with dependency status
//! - GET /health/ready - Readiness probe
//! - GET /health/live - Liveness probe
//! - GET /metrics - Prometheus exposition
//!
//! The test app runs without Redis, so the Redis check is omitted.

use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_liveness_endpoint() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_endpoint_without_redis() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_full_health_check_structure() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_seconds"].is_u64());
    assert!(json["timestamp"].is_string());
    assert!(json["checks"].get("redis").is_none());
    assert!(json["stats"]["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_health_endpoints_need_no_api_key() {
    let app = TestApp::spawn().await;

    for path in ["/health", "/health/ready", "/health/live"] {
        app.server.get(path).await.assert_status_ok();
    }
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    let app = TestApp::spawn().await;
    shroud::routes::metrics::init_metrics();

    app.server.get("/metrics").await.assert_status_ok();
}
