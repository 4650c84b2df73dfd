//! In-memory collaborators for tests
//!
//! Stand-ins for the quota service, credential store, API-key store and the audit
//! and usage sinks, so the gateway can run without Redis. Recording sinks keep
//! everything they receive for assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{InMemoryTokenCache, TokenCache};
use crate::error::{AppError, AppResult};
use crate::gateway::{
    AuditEvent, AuditSink, GatewayDeps, QuotaService, QuotaStatus, RequestStats, UsageSink,
};
use crate::middleware::auth::{hash_key, ApiKeyRecord, ApiKeyStore};
use crate::providers::{CredentialStore, ProviderId};

fn store_down() -> AppError {
    AppError::Internal(anyhow::anyhow!("store unavailable"))
}

/// Quota service over a fixed table
#[derive(Default)]
pub struct InMemoryQuotaService {
    quotas: HashMap<String, QuotaStatus>,
    failing: bool,
}

impl InMemoryQuotaService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, tenant_id: &str, status: QuotaStatus) -> Self {
        self.quotas.insert(tenant_id.to_string(), status);
        self
    }

    /// Every lookup fails
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[async_trait]
impl QuotaService for InMemoryQuotaService {
    async fn quota(&self, tenant_id: &str) -> AppResult<QuotaStatus> {
        if self.failing {
            return Err(store_down());
        }
        self.quotas
            .get(tenant_id)
            .copied()
            .ok_or_else(|| AppError::QuotaUnavailable(format!("no quota record for {}", tenant_id)))
    }
}

/// Credential store over fixed tenant and global tables
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tenant: HashMap<(String, ProviderId), String>,
    global: HashMap<ProviderId, String>,
    failing: bool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant_id: &str, provider: ProviderId, key: &str) -> Self {
        self.tenant
            .insert((tenant_id.to_string(), provider), key.to_string());
        self
    }

    pub fn with_global(mut self, provider: ProviderId, key: &str) -> Self {
        self.global.insert(provider, key.to_string());
        self
    }

    /// Every lookup fails
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn tenant_credential(
        &self,
        tenant_id: &str,
        provider: ProviderId,
    ) -> AppResult<Option<String>> {
        if self.failing {
            return Err(store_down());
        }
        Ok(self.tenant.get(&(tenant_id.to_string(), provider)).cloned())
    }

    async fn global_credential(&self, provider: ProviderId) -> AppResult<Option<String>> {
        if self.failing {
            return Err(store_down());
        }
        Ok(self.global.get(&provider).cloned())
    }
}

/// API-key store keyed by the digest of the plaintext key
#[derive(Default)]
pub struct InMemoryApiKeyStore {
    records: HashMap<String, ApiKeyRecord>,
}

impl InMemoryApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(self, key: &str, tenant_id: &str) -> Self {
        self.with_record(key, tenant_id, true)
    }

    pub fn with_disabled_key(self, key: &str, tenant_id: &str) -> Self {
        self.with_record(key, tenant_id, false)
    }

    fn with_record(mut self, key: &str, tenant_id: &str, enabled: bool) -> Self {
        self.records.insert(
            hash_key(key),
            ApiKeyRecord {
                tenant_id: tenant_id.to_string(),
                name: "test".to_string(),
                enabled,
            },
        );
        self
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn lookup(&self, key_digest: &str) -> AppResult<Option<ApiKeyRecord>> {
        Ok(self.records.get(key_digest).cloned())
    }
}

/// Audit sink that keeps every event
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn append(&self, event: &AuditEvent) -> AppResult<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Usage sink that keeps request records and running tenant totals
#[derive(Default)]
pub struct RecordingUsageSink {
    requests: Mutex<Vec<RequestStats>>,
    usage: Mutex<HashMap<String, i64>>,
    attempts: AtomicUsize,
    delay: Option<Duration>,
    failing: bool,
}

impl RecordingUsageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every write
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every write fails (after being counted)
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn requests(&self) -> Vec<RequestStats> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn tenant_usage(&self, tenant_id: &str) -> i64 {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tenant_id)
            .copied()
            .unwrap_or(0)
    }

    /// Writes attempted, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn begin_write(&self) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(store_down());
        }
        Ok(())
    }
}

#[async_trait]
impl UsageSink for RecordingUsageSink {
    async fn record_request(&self, stats: &RequestStats) -> AppResult<()> {
        self.begin_write().await?;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stats.clone());
        Ok(())
    }

    async fn increment_tenant_usage(&self, tenant_id: &str, amount: i64) -> AppResult<()> {
        self.begin_write().await?;
        *self
            .usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tenant_id.to_string())
            .or_insert(0) += amount;
        Ok(())
    }
}

/// Shared handles to every in-memory collaborator of one gateway
pub struct TestCollaborators {
    pub quota: Arc<InMemoryQuotaService>,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub token_cache: Arc<InMemoryTokenCache>,
    pub audit: Arc<RecordingAuditSink>,
    pub usage: Arc<RecordingUsageSink>,
}

impl TestCollaborators {
    pub fn new(quota: InMemoryQuotaService, credentials: InMemoryCredentialStore) -> Self {
        Self {
            quota: Arc::new(quota),
            credentials: Arc::new(credentials),
            token_cache: Arc::new(InMemoryTokenCache::new()),
            audit: Arc::new(RecordingAuditSink::new()),
            usage: Arc::new(RecordingUsageSink::new()),
        }
    }

    pub fn deps(&self) -> GatewayDeps {
        GatewayDeps {
            quota: self.quota.clone(),
            credentials: self.credentials.clone(),
            token_cache: Some(self.token_cache.clone() as Arc<dyn TokenCache>),
            audit: self.audit.clone(),
            usage: self.usage.clone(),
        }
    }
}

/// Poll `condition` until it holds, for at most two seconds
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Mock upstream that answers with the last message it was sent
#[cfg(test)]
pub struct EchoResponder;

#[cfg(test)]
impl wiremock::Respond for EchoResponder {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let last = body["messages"]
            .as_array()
            .and_then(|messages| messages.last())
            .map(|message| message["content"].clone())
            .unwrap_or_default();

        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-echo",
            "object": "chat.completion",
            "created": 0,
            "model": body["model"],
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": last},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
        }))
    }
}

/// Mock upstream that fails with `status` and quotes the last message in its error
#[cfg(test)]
pub struct ErrorEchoResponder(pub u16);

#[cfg(test)]
impl wiremock::Respond for ErrorEchoResponder {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let last = body["messages"]
            .as_array()
            .and_then(|messages| messages.last())
            .and_then(|message| message["content"].as_str())
            .unwrap_or_default()
            .to_string();

        wiremock::ResponseTemplate::new(self.0).set_body_json(serde_json::json!({
            "error": {
                "message": format!("Invalid input: {}", last),
                "type": "invalid_request_error"
            }
        }))
    }
}
