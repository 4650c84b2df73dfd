//! In-memory token cache
//!
//! Stands in for Redis in tests and single-process runs. Entries expire lazily on
//! read and are swept on write.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::TokenCache;
use crate::error::AppResult;

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Token cache held in process memory
#[derive(Default)]
pub struct InMemoryTokenCache {
    data: RwLock<HashMap<(String, String), CacheEntry>>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.values().filter(|e| !e.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries (useful for test isolation)
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.clear();
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn put(
        &self,
        tenant_id: &str,
        token: &str,
        original: &str,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.retain(|_, entry| !entry.is_expired());
        data.insert(
            (tenant_id.to_string(), token.to_string()),
            CacheEntry {
                value: original.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn get(&self, tenant_id: &str, token: &str) -> AppResult<Option<String>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data
            .get(&(tenant_id.to_string(), token.to_string()))
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }
}
