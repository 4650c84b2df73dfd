//! Redis cache implementation
//!
//! Thin wrapper over a multiplexed connection manager, shared by the token cache,
//! credential store, quota lookup and background sinks.

use async_trait::async_trait;
use redis::AsyncCommands;

use super::TokenCache;
use crate::error::AppResult;

/// Redis cache wrapper
#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Create a new Redis cache
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    /// Get a string value
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Set a string value with a TTL
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// Get one field of a hash
    pub async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(key, field).await?;
        Ok(value)
    }

    /// Get several fields of a hash, in order
    pub async fn hget_many(&self, key: &str, fields: &[&str]) -> AppResult<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    /// Increment a hash field
    pub async fn hincr(&self, key: &str, field: &str, delta: i64) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.hincr(key, field, delta).await?;
        Ok(value)
    }

    /// Append a value to a list
    pub async fn rpush(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// Set expiry on a key
    pub async fn expire(&self, key: &str, seconds: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.expire::<_, ()>(key, seconds as i64).await?;
        Ok(())
    }

    /// Round-trip a PING
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

/// Token cache backed by Redis `SET EX`
pub struct RedisTokenCache {
    redis: RedisCache,
}

impl RedisTokenCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn put(
        &self,
        tenant_id: &str,
        token: &str,
        original: &str,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        self.redis
            .set_with_ttl(&keys::token(tenant_id, token), original, ttl_seconds)
            .await
    }

    async fn get(&self, tenant_id: &str, token: &str) -> AppResult<Option<String>> {
        self.redis.get(&keys::token(tenant_id, token)).await
    }
}

/// Cache key layout
pub mod keys {
    /// Mirrored redaction token of one tenant
    pub fn token(tenant_id: &str, token: &str) -> String {
        format!("shroud:token:{}:{}", tenant_id, token)
    }

    /// Encrypted tenant credential for one provider
    pub fn tenant_credential(tenant_id: &str, provider: &str) -> String {
        format!("provider:{}:{}", tenant_id, provider)
    }

    /// Hash of shared gateway settings (global credentials)
    pub const GATEWAY_CONFIG: &str = "config:gateway";

    /// Field holding a provider's shared credential in `GATEWAY_CONFIG`
    pub fn global_credential_field(provider: &str) -> String {
        format!("{}_api_key", provider)
    }

    /// Tenant quota hash (`current_usage`, `monthly_quota`, `overage_allowed`)
    pub fn tenant(tenant_id: &str) -> String {
        format!("shroud:tenant:{}", tenant_id)
    }

    /// Gateway API key record, addressed by the key's SHA-256 digest
    pub fn api_key(digest: &str) -> String {
        format!("shroud:apikey:{}", digest)
    }

    /// Hourly usage bucket
    pub fn usage_bucket(tenant_id: &str, hour: &str) -> String {
        format!("shroud:usage:{}:{}", tenant_id, hour)
    }

    /// Audit event list
    pub const AUDIT_LOG: &str = "shroud:audit";
}
