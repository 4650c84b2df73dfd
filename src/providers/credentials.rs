//! Credential resolution
//!
//! Resolution chain: tenant-scoped key, then (for the free-tier fallback provider
//! only) the shared gateway key, then the environment default.

use std::sync::Arc;

use async_trait::async_trait;

use super::cipher::KeyCipher;
use super::ProviderId;
use crate::cache::redis::keys;
use crate::cache::RedisCache;
use crate::error::{AppError, AppResult};

/// Read-only view of the external credential store
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Decrypted tenant key for a provider
    async fn tenant_credential(
        &self,
        tenant_id: &str,
        provider: ProviderId,
    ) -> AppResult<Option<String>>;

    /// Shared gateway key for a provider
    async fn global_credential(&self, provider: ProviderId) -> AppResult<Option<String>>;
}

/// Walks the credential fallback chain
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    fallback_provider: ProviderId,
    env_fallback: Option<String>,
}

impl CredentialResolver {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        fallback_provider: ProviderId,
        env_fallback: Option<String>,
    ) -> Self {
        Self {
            store,
            fallback_provider,
            env_fallback,
        }
    }

    /// Resolve the API key used for `tenant_id` against `provider`
    ///
    /// Store failures are logged and treated as an absent credential so the free
    /// tier keeps working on its environment key.
    pub async fn resolve(&self, tenant_id: &str, provider: ProviderId) -> AppResult<String> {
        match self.store.tenant_credential(tenant_id, provider).await {
            Ok(Some(key)) if !key.is_empty() => return Ok(key),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(tenant_id, provider = %provider, error = %e, "Tenant credential lookup failed");
            }
        }

        if provider != self.fallback_provider {
            return Err(AppError::ProviderNotConfigured(provider.to_string()));
        }

        match self.store.global_credential(provider).await {
            Ok(Some(key)) if !key.is_empty() => return Ok(key),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "Global credential lookup failed");
            }
        }

        self.env_fallback
            .clone()
            .ok_or_else(|| AppError::ProviderNotConfigured(provider.to_string()))
    }

    /// Whether any credential resolves for this tenant and provider
    pub async fn has_credential(&self, tenant_id: &str, provider: ProviderId) -> bool {
        self.resolve(tenant_id, provider).await.is_ok()
    }
}

/// Credential store reading encrypted tenant keys and the shared gateway hash
pub struct RedisCredentialStore {
    redis: RedisCache,
    cipher: Option<KeyCipher>,
}

impl RedisCredentialStore {
    pub fn new(redis: RedisCache, cipher: Option<KeyCipher>) -> Self {
        Self { redis, cipher }
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn tenant_credential(
        &self,
        tenant_id: &str,
        provider: ProviderId,
    ) -> AppResult<Option<String>> {
        let Some(stored) = self
            .redis
            .get(&keys::tenant_credential(tenant_id, provider.as_str()))
            .await?
        else {
            return Ok(None);
        };

        let Some(cipher) = &self.cipher else {
            tracing::warn!(tenant_id, provider = %provider, "Tenant credential present but ENCRYPTION_KEY is not set");
            return Ok(None);
        };

        match cipher.decrypt(&stored) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                tracing::warn!(tenant_id, provider = %provider, error = %e, "Failed to decrypt tenant credential");
                Ok(None)
            }
        }
    }

    async fn global_credential(&self, provider: ProviderId) -> AppResult<Option<String>> {
        self.redis
            .hget(
                keys::GATEWAY_CONFIG,
                &keys::global_credential_field(provider.as_str()),
            )
            .await
    }
}
