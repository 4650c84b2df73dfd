//! Rehydrator: restore original values in provider responses
//!
//! Pass 1 substitutes every token of the request-scoped map verbatim. Pass 2 looks
//! for any remaining token-shaped text, including placeholders the model reformatted,
//! and resolves it through the map or the calling tenant's entries in the shared
//! cache. Unresolved placeholders are left in place.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use metrics::counter;
use regex::Captures;

use super::token::{format_placeholder, mask, TokenMap, LENIENT_TOKEN};
use crate::cache::TokenCache;

/// Reverses tokenization
pub struct Rehydrator {
    cache: Option<Arc<dyn TokenCache>>,
}

impl Rehydrator {
    pub fn new(cache: Option<Arc<dyn TokenCache>>) -> Self {
        Self { cache }
    }

    /// Restore every placeholder in `text` for `tenant_id`
    ///
    /// With `json_escape` set, restored values are escaped as JSON string content so
    /// quotes or backslashes in a secret cannot break the surrounding document.
    pub async fn rehydrate(
        &self,
        tenant_id: &str,
        text: &str,
        map: &TokenMap,
        json_escape: bool,
    ) -> String {
        let mut restored = text.to_string();

        // Newest first, so a value containing an older placeholder expands fully
        for token in map.iter().rev() {
            let placeholder = token.placeholder();
            if restored.contains(&placeholder) {
                tracing::debug!(
                    token = %placeholder,
                    masked = %mask(&token.original_value),
                    "Rehydrated secret"
                );
                restored =
                    restored.replace(&placeholder, &encode(&token.original_value, json_escape));
            }
        }

        if !LENIENT_TOKEN.is_match(&restored) {
            return restored;
        }

        let resolved = self.resolve_remaining(tenant_id, &restored, map).await;

        LENIENT_TOKEN
            .replace_all(&restored, |caps: &Captures| {
                let key = normalise(caps);
                match resolved.get(&key) {
                    Some(value) => encode(value, json_escape),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    async fn resolve_remaining(
        &self,
        tenant_id: &str,
        text: &str,
        map: &TokenMap,
    ) -> HashMap<String, String> {
        let mut resolved = HashMap::new();
        let mut seen = HashSet::new();

        let keys: Vec<String> = LENIENT_TOKEN
            .captures_iter(text)
            .map(|caps| normalise(&caps))
            .collect();

        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }

            if let Some(value) = map.get(&key) {
                resolved.insert(key, value.to_string());
                continue;
            }

            match self.lookup_cache(tenant_id, &key).await {
                Some(value) => {
                    tracing::debug!(
                        token = %key,
                        masked = %mask(&value),
                        "Rehydrated secret from cache"
                    );
                    resolved.insert(key, value);
                }
                None => {
                    tracing::warn!(token = %key, "Rehydration miss, placeholder left in response");
                    counter!("shroud_rehydration_misses_total").increment(1);
                }
            }
        }

        resolved
    }

    async fn lookup_cache(&self, tenant_id: &str, key: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get(tenant_id, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(token = %key, error = %e, "Token cache lookup failed");
                None
            }
        }
    }
}

/// Canonical placeholder for a lenient match
fn normalise(caps: &Captures) -> String {
    format_placeholder(&caps[1].to_uppercase(), &caps[2].to_lowercase())
}

fn encode(value: &str, json_escape: bool) -> String {
    if !json_escape {
        return value.to_string();
    }

    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
