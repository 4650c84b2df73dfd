//! External collaborators consumed by the gateway
//!
//! Quota lookup, audit sink and usage sink are owned by other services; the gateway
//! only reads quotas and appends events. Redis-backed implementations are provided
//! for deployment.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::redis::keys;
use crate::cache::RedisCache;
use crate::error::{AppError, AppResult};

/// Hourly usage buckets are kept this long
const USAGE_BUCKET_TTL_SECONDS: u64 = 90 * 24 * 3600;

/// Tenant allowance at the time of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub current_usage: i64,
    pub monthly_quota: i64,
    pub overage_allowed: bool,
}

impl QuotaStatus {
    /// Whether a new request must be rejected
    pub fn is_exhausted(&self) -> bool {
        self.current_usage >= self.monthly_quota && !self.overage_allowed
    }
}

/// Read-only tenant quota lookup
#[async_trait]
pub trait QuotaService: Send + Sync {
    async fn quota(&self, tenant_id: &str) -> AppResult<QuotaStatus>;
}

/// One `PROXY_REQUEST` audit record
///
/// Secrets appear only masked, in `pii_details`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditEvent {
    pub event_type: &'static str,
    pub tenant_id: String,
    pub provider: String,
    pub model: String,
    pub status: u16,
    pub latency_ms: u64,
    pub redacted: bool,
    pub redact_count: usize,
    pub request_len: usize,
    pub response_len: usize,
    pub pii_details: BTreeMap<String, String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub const PROXY_REQUEST: &'static str = "PROXY_REQUEST";
}

/// Append-only audit log
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> AppResult<()>;
}

/// Per-request statistics for the hourly usage record
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStats {
    pub tenant_id: String,
    pub latency_ms: u64,
    pub is_error: bool,
    pub total_tokens: u64,
    pub timestamp: DateTime<Utc>,
}

impl RequestStats {
    /// `YYYYMMDDHH` bucket this request falls in
    pub fn hour_bucket(&self) -> String {
        self.timestamp.format("%Y%m%d%H").to_string()
    }
}

/// Usage counters
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Add one request to the tenant's hourly record
    async fn record_request(&self, stats: &RequestStats) -> AppResult<()>;

    /// Add to the tenant's running usage counter (checked by the quota lookup)
    async fn increment_tenant_usage(&self, tenant_id: &str, amount: i64) -> AppResult<()>;
}

/// Quota lookup over the tenant hash
pub struct RedisQuotaService {
    redis: RedisCache,
}

impl RedisQuotaService {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl QuotaService for RedisQuotaService {
    async fn quota(&self, tenant_id: &str) -> AppResult<QuotaStatus> {
        let values = self
            .redis
            .hget_many(
                &keys::tenant(tenant_id),
                &["current_usage", "monthly_quota", "overage_allowed"],
            )
            .await?;

        let field = |i: usize| values.get(i).cloned().flatten();

        let monthly_quota = field(1).and_then(|v| v.parse().ok()).ok_or_else(|| {
            AppError::QuotaUnavailable(format!("no quota record for {}", tenant_id))
        })?;

        Ok(QuotaStatus {
            current_usage: field(0).and_then(|v| v.parse().ok()).unwrap_or(0),
            monthly_quota,
            overage_allowed: field(2)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

/// Audit sink appending JSON events to a Redis list
pub struct RedisAuditSink {
    redis: RedisCache,
}

impl RedisAuditSink {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl AuditSink for RedisAuditSink {
    async fn append(&self, event: &AuditEvent) -> AppResult<()> {
        let json = serde_json::to_string(event).map_err(|e| AppError::Internal(e.into()))?;
        self.redis.rpush(keys::AUDIT_LOG, &json).await
    }
}

/// Usage sink over hourly Redis hashes
pub struct RedisUsageSink {
    redis: RedisCache,
}

impl RedisUsageSink {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl UsageSink for RedisUsageSink {
    async fn record_request(&self, stats: &RequestStats) -> AppResult<()> {
        let key = keys::usage_bucket(&stats.tenant_id, &stats.hour_bucket());

        self.redis.hincr(&key, "requests", 1).await?;
        if stats.is_error {
            self.redis.hincr(&key, "errors", 1).await?;
        }
        self.redis
            .hincr(&key, "latency_ms", stats.latency_ms as i64)
            .await?;
        if stats.total_tokens > 0 {
            self.redis
                .hincr(&key, "tokens", stats.total_tokens as i64)
                .await?;
        }
        self.redis.expire(&key, USAGE_BUCKET_TTL_SECONDS).await
    }

    async fn increment_tenant_usage(&self, tenant_id: &str, amount: i64) -> AppResult<()> {
        self.redis
            .hincr(&keys::tenant(tenant_id), "current_usage", amount)
            .await?;
        Ok(())
    }
}
