//! Upstream providers
//!
//! Provider identities, the descriptor registry that maps models to providers, and
//! credential resolution.

pub mod cipher;
pub mod credentials;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use cipher::{CipherError, KeyCipher};
pub use credentials::{CredentialResolver, CredentialStore, RedisCredentialStore};
pub use registry::{AdapterKind, AuthScheme, ProviderDescriptor, ProviderRegistry};

/// Identity of an upstream LLM vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    DeepSeek,
    Gemini,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::DeepSeek,
        ProviderId::Gemini,
    ];

    /// Lowercase name used in keys, metrics and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Public API base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com/v1",
            ProviderId::DeepSeek => "https://api.deepseek.com",
            ProviderId::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    /// Environment variable conventionally holding this provider's key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown provider '{}'", s))
    }
}
