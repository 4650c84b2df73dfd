//! Cache module
//!
//! Shared short-lived storage for redaction tokens, plus the Redis wrapper used by
//! the other Redis-backed collaborators.

pub mod in_memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::AppResult;

pub use self::in_memory::InMemoryTokenCache;
pub use self::redis::{RedisCache, RedisTokenCache};

/// Shared token store that lets a placeholder outlive the request that created it
///
/// Entries are scoped to the tenant that minted them: a placeholder only resolves for
/// the same tenant. Implementations enforce their own TTL eviction and must be safe
/// for concurrent use.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Mirror a token and its original value for `ttl_seconds`
    async fn put(
        &self,
        tenant_id: &str,
        token: &str,
        original: &str,
        ttl_seconds: u64,
    ) -> AppResult<()>;

    /// Look up the original value of a tenant's token, `None` once expired
    async fn get(&self, tenant_id: &str, token: &str) -> AppResult<Option<String>>;
}
