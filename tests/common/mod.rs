//! Common test utilities for the gateway integration tests
//!
//! Every test app runs the real router over in-memory collaborators, with all
//! providers pointed at one wiremock server.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

use shroud::gateway::QuotaStatus;
use shroud::providers::ProviderId;
use shroud::routes::create_router;
use shroud::testing::{
    InMemoryApiKeyStore, InMemoryCredentialStore, InMemoryQuotaService, TestCollaborators,
};
use shroud::{AppState, Config};

/// Test constants
pub mod constants {
    /// Gateway key of the default tenant
    pub const TEST_API_KEY: &str = "sk-shroud-test-key";
    /// Gateway key that exists but is disabled
    pub const DISABLED_API_KEY: &str = "sk-shroud-disabled-key";
    /// Tenant owning both keys
    pub const TEST_TENANT: &str = "tenant_123";
    /// Provider credential configured for the tenant
    pub const DEEPSEEK_KEY: &str = "sk-deepseek-tenant";
}

/// A running gateway plus handles to its upstream and collaborators
pub struct TestApp {
    pub server: TestServer,
    pub upstream: MockServer,
    pub collaborators: TestCollaborators,
}

impl TestApp {
    /// Gateway with quota left and a DeepSeek credential for the test tenant
    pub async fn spawn() -> Self {
        Self::spawn_with(
            InMemoryQuotaService::new().with_quota(constants::TEST_TENANT, quota(5, 100)),
            InMemoryCredentialStore::new().with_tenant(
                constants::TEST_TENANT,
                ProviderId::DeepSeek,
                constants::DEEPSEEK_KEY,
            ),
        )
        .await
    }

    pub async fn spawn_with(
        quota: InMemoryQuotaService,
        credentials: InMemoryCredentialStore,
    ) -> Self {
        let upstream = MockServer::start().await;
        let collaborators = TestCollaborators::new(quota, credentials);
        let api_keys = InMemoryApiKeyStore::new()
            .with_key(constants::TEST_API_KEY, constants::TEST_TENANT)
            .with_disabled_key(constants::DISABLED_API_KEY, constants::TEST_TENANT);

        let state = AppState::new_for_testing(
            Config::for_testing(&upstream.uri()),
            collaborators.deps(),
            Arc::new(api_keys),
        )
        .expect("Failed to build app state");

        let server =
            TestServer::new(create_router(Arc::new(state))).expect("Failed to create test server");

        Self {
            server,
            upstream,
            collaborators,
        }
    }

    /// POST a JSON body to `path` with the test tenant's key
    pub fn post_authed(&self, path: &str, body: &Value) -> TestRequest {
        self.server
            .post(path)
            .add_header(AUTHORIZATION, bearer(constants::TEST_API_KEY))
            .json(body)
    }

    /// GET `path` with the test tenant's key
    pub fn get_authed(&self, path: &str) -> TestRequest {
        self.server
            .get(path)
            .add_header(AUTHORIZATION, bearer(constants::TEST_API_KEY))
    }
}

pub fn quota(current_usage: i64, monthly_quota: i64) -> QuotaStatus {
    QuotaStatus {
        current_usage,
        monthly_quota,
        overage_allowed: false,
    }
}

pub fn bearer(key: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", key)).expect("valid header value")
}

pub fn debug_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-shroud-debug"),
        HeaderValue::from_static("true"),
    )
}

/// A chat request for `model` carrying one user message
pub fn chat_request(model: &str, content: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": content}]
    })
}

/// Upstream that answers with the content of the last message it received
pub struct EchoUpstream;

impl Respond for EchoUpstream {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let last = body["messages"]
            .as_array()
            .and_then(|messages| messages.last())
            .map(|message| message["content"].clone())
            .unwrap_or_default();

        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-echo",
            "object": "chat.completion",
            "created": 0,
            "model": body["model"],
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": last},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 3, "total_tokens": 6}
        }))
    }
}

/// Upstream that rejects with `status` and quotes the last message back in its error
pub struct ErrorEchoUpstream(pub u16);

impl Respond for ErrorEchoUpstream {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let last = body["messages"]
            .as_array()
            .and_then(|messages| messages.last())
            .and_then(|message| message["content"].as_str())
            .unwrap_or_default()
            .to_string();

        ResponseTemplate::new(self.0).set_body_json(json!({
            "error": {"message": format!("Rejected prompt: {}", last)}
        }))
    }
}
