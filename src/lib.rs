//! Shroud - redacting LLM gateway
//!
//! Strips secrets from chat-completion traffic before it leaves the trust boundary,
//! translates between provider wire formats, forwards to the right provider with the
//! right credential, and restores the secrets in the provider's response.
//!
//! The `shroud-connect` binary is the client-side companion: a local MITM proxy that
//! redirects direct provider calls through the gateway.

pub mod cache;
pub mod canonical;
pub mod config;
pub mod error;
pub mod gateway;
pub mod interception;
pub mod middleware;
pub mod providers;
pub mod proxy;
pub mod redaction;
pub mod routes;
pub mod translate;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

pub use crate::cache::{RedisCache, RedisTokenCache, TokenCache};
pub use crate::config::Config;
pub use crate::gateway::{Gateway, GatewayDeps};
pub use crate::middleware::{ApiKeyStore, RedisApiKeyStore};
pub use crate::providers::{KeyCipher, RedisCredentialStore};

use crate::gateway::{RedisAuditSink, RedisQuotaService, RedisUsageSink};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Shared Redis handle, absent when running on in-memory collaborators
    pub redis: Option<RedisCache>,
    pub gateway: Gateway,
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state backed by Redis
    pub async fn new(config: Config) -> Result<Self> {
        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let conn = redis::aio::ConnectionManager::new(redis_client).await?;
        let redis = RedisCache::new(conn);

        let cipher = config
            .encryption_key
            .as_deref()
            .map(KeyCipher::from_hex)
            .transpose()
            .context("Invalid ENCRYPTION_KEY")?;
        if cipher.is_none() {
            tracing::warn!("ENCRYPTION_KEY not set, tenant provider credentials cannot be read");
        }

        let deps = GatewayDeps {
            quota: Arc::new(RedisQuotaService::new(redis.clone())),
            credentials: Arc::new(RedisCredentialStore::new(redis.clone(), cipher)),
            token_cache: Some(Arc::new(RedisTokenCache::new(redis.clone()))),
            audit: Arc::new(RedisAuditSink::new(redis.clone())),
            usage: Arc::new(RedisUsageSink::new(redis.clone())),
        };

        let gateway = Gateway::new(&config, deps)?;
        let api_keys = Arc::new(RedisApiKeyStore::new(redis.clone()));

        Ok(Self {
            config,
            redis: Some(redis),
            gateway,
            api_keys,
            start_time: Instant::now(),
        })
    }

    /// Create an application state over injected collaborators, without Redis
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        deps: GatewayDeps,
        api_keys: Arc<dyn ApiKeyStore>,
    ) -> Result<Self> {
        let gateway = Gateway::new(&config, deps)?;

        Ok(Self {
            config,
            redis: None,
            gateway,
            api_keys,
            start_time: Instant::now(),
        })
    }
}
