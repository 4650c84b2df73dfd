//! Models endpoint integration tests
//!
//! GET /v1/models lists only the models of providers the tenant can reach.

use axum::http::StatusCode;
use serde_json::Value;

use shroud::providers::ProviderId;
use shroud::testing::{InMemoryCredentialStore, InMemoryQuotaService};

use crate::common::{constants, quota, TestApp};

fn model_ids(json: &Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_models_filtered_by_tenant_credentials() {
    let app = TestApp::spawn().await;

    let response = app.get_authed("/v1/models").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["object"], "list");

    let ids = model_ids(&json);
    assert!(ids.contains(&"deepseek-chat".to_string()));
    assert!(!ids.contains(&"gpt-4o".to_string()));
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["owned_by"] == "deepseek" && m["object"] == "model"));
}

#[tokio::test]
async fn test_global_credentials_expose_models() {
    let app = TestApp::spawn_with(
        InMemoryQuotaService::new().with_quota(constants::TEST_TENANT, quota(0, 10)),
        InMemoryCredentialStore::new()
            .with_global(ProviderId::OpenAi, "sk-global-openai")
            .with_tenant(constants::TEST_TENANT, ProviderId::Anthropic, "ant-key"),
    )
    .await;

    let json: Value = app.get_authed("/models").await.json();
    let ids = model_ids(&json);

    assert!(ids.contains(&"gpt-4o".to_string()));
    assert!(ids.contains(&"claude-3-opus".to_string()));
    assert!(!ids.contains(&"gemini-pro".to_string()));
}

#[tokio::test]
async fn test_models_requires_api_key() {
    let app = TestApp::spawn().await;

    app.server
        .get("/v1/models")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
