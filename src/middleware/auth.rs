//! Authentication middleware
//!
//! Resolves the gateway API key in `Authorization: Bearer` to a tenant. Keys are
//! stored by SHA-256 digest, never in plaintext.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::cache::redis::keys;
use crate::cache::RedisCache;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Tenant attached to an authenticated request
#[derive(Debug, Clone)]
pub struct AuthenticatedTenant {
    pub tenant_id: String,
    pub key_name: String,
}

/// Stored record behind a gateway API key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKeyRecord {
    pub tenant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Lookup of gateway API keys by digest
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn lookup(&self, key_digest: &str) -> AppResult<Option<ApiKeyRecord>>;
}

/// API keys stored as JSON under `shroud:apikey:{digest}`
pub struct RedisApiKeyStore {
    redis: RedisCache,
}

impl RedisApiKeyStore {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ApiKeyStore for RedisApiKeyStore {
    async fn lookup(&self, key_digest: &str) -> AppResult<Option<ApiKeyRecord>> {
        let Some(raw) = self.redis.get(&keys::api_key(key_digest)).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable API key record");
                Ok(None)
            }
        }
    }
}

/// Extract the Authorization header and return the bearer token
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hash an API key for storage lookup
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Authentication middleware
///
/// Adds `AuthenticatedTenant` to request extensions. Missing, unknown and
/// disabled keys are all rejected with 401.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or(AppError::Unauthorized)?;

    let digest = hash_key(token);

    let record = match state.api_keys.lookup(&digest).await? {
        Some(record) if record.enabled => record,
        Some(_) => {
            warn!(key_digest = %&digest[..12], "Disabled API key used");
            return Err(AppError::Unauthorized);
        }
        None => {
            debug!(key_digest = %&digest[..12], "Unknown API key");
            return Err(AppError::Unauthorized);
        }
    };

    debug!(tenant_id = %record.tenant_id, key_name = %record.name, "Tenant authenticated");

    request.extensions_mut().insert(AuthenticatedTenant {
        tenant_id: record.tenant_id,
        key_name: record.name,
    });

    Ok(next.run(request).await)
}
