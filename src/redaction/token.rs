//! Redaction tokens
//!
//! A token is the placeholder text `<SECRET:LABEL:ID>` standing in for one detected
//! secret. IDs combine a per-instance random prefix, a monotonic counter and a
//! per-call random nonce, so two tokens minted in the same clock tick still differ
//! and two gateway instances sharing a cache do not collide.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder shape tolerant of whitespace, case and `<`/`>` escaped brackets
pub(crate) static LENIENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:<|\\u003c)\s*SECRET\s*:\s*([a-z_]+)\s*:\s*([0-9a-f]+)\s*(?:>|\\u003e)",
    )
    .expect("token pattern is valid")
});

/// One detected secret and its placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionToken {
    /// Unique part of the placeholder
    pub token_id: String,
    /// Pattern label that matched
    pub label: &'static str,
    /// Plaintext that was replaced
    pub original_value: String,
    /// When the token was minted
    pub created_at: DateTime<Utc>,
}

impl RedactionToken {
    /// Placeholder text written in place of the secret
    pub fn placeholder(&self) -> String {
        format_placeholder(self.label, &self.token_id)
    }
}

/// Render `<SECRET:LABEL:ID>`
pub fn format_placeholder(label: &str, token_id: &str) -> String {
    format!("<SECRET:{}:{}>", label, token_id)
}

/// Mints unique token IDs
#[derive(Debug)]
pub struct TokenIdGenerator {
    prefix: u32,
    counter: AtomicU64,
}

impl TokenIdGenerator {
    pub fn new() -> Self {
        Self {
            prefix: rand::random(),
            counter: AtomicU64::new(0),
        }
    }

    /// Next ID: lowercase hex, at least 17 characters
    pub fn next_id(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let nonce: u32 = rand::random();
        format!("{:08x}{:x}{:08x}", self.prefix, sequence, nonce)
    }
}

impl Default for TokenIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Request-scoped mapping from placeholder to plaintext, in creation order
#[derive(Debug, Clone, Default)]
pub struct TokenMap {
    tokens: Vec<RedactionToken>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: RedactionToken) {
        self.tokens.push(token);
    }

    /// Original value for a placeholder
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.placeholder() == placeholder)
            .map(|t| t.original_value.as_str())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RedactionToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Placeholder to masked value, safe to log or audit
    pub fn masked_details(&self) -> BTreeMap<String, String> {
        self.tokens
            .iter()
            .map(|t| (t.placeholder(), mask(&t.original_value)))
            .collect()
    }
}

/// Mask a secret for logs: first and last four characters, or a constant when short
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
