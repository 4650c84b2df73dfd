//! Configuration management for Shroud
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

use crate::providers::ProviderId;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Redis connection URL (token cache, credential store, quota and sinks)
    pub redis_url: String,

    /// OpenAI API URL
    pub openai_api_url: String,
    /// Anthropic API URL
    pub anthropic_api_url: String,
    /// DeepSeek API URL
    pub deepseek_api_url: String,
    /// Gemini OpenAI-compatibility API URL
    pub gemini_api_url: String,

    /// Provider used when no registry entry claims the requested model
    pub default_provider: ProviderId,
    /// Free-tier provider allowed to fall back to shared credentials
    pub fallback_provider: ProviderId,
    /// Environment-level credential for the fallback provider
    pub fallback_api_key: Option<String>,

    /// Hex-encoded AES-256 key protecting tenant provider credentials
    pub encryption_key: Option<String>,

    /// Lifetime of mirrored redaction tokens (in seconds)
    pub token_ttl_seconds: u64,
    /// Upper bound for one upstream call (in seconds)
    pub upstream_timeout_seconds: u64,

    /// Capacity of the audit/usage background queue
    pub background_queue_size: usize,
    /// Maximum sink writes per second from the background worker
    pub sink_rate_per_second: u32,
    /// How often aggregated tenant usage is flushed (in milliseconds)
    pub usage_flush_ms: u64,

    /// Enable the redacted-content debug header
    pub debug_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let fallback_provider: ProviderId = env::var("SHROUD_FALLBACK_PROVIDER")
            .unwrap_or_else(|_| "deepseek".to_string())
            .parse()
            .context("Invalid SHROUD_FALLBACK_PROVIDER")?;

        let fallback_api_key = env::var("SHROUD_FALLBACK_API_KEY")
            .or_else(|_| env::var(fallback_provider.api_key_env()))
            .ok()
            .filter(|k| !k.is_empty());

        Ok(Self {
            host: env::var("SHROUD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SHROUD_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SHROUD_PORT")?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| ProviderId::OpenAi.default_base_url().to_string()),
            anthropic_api_url: env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| ProviderId::Anthropic.default_base_url().to_string()),
            deepseek_api_url: env::var("DEEPSEEK_API_URL")
                .unwrap_or_else(|_| ProviderId::DeepSeek.default_base_url().to_string()),
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| ProviderId::Gemini.default_base_url().to_string()),

            default_provider: env::var("SHROUD_DEFAULT_PROVIDER")
                .unwrap_or_else(|_| "deepseek".to_string())
                .parse()
                .context("Invalid SHROUD_DEFAULT_PROVIDER")?,
            fallback_provider,
            fallback_api_key,

            encryption_key: env::var("ENCRYPTION_KEY").ok().filter(|k| !k.is_empty()),

            token_ttl_seconds: env::var("SHROUD_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("Invalid SHROUD_TOKEN_TTL_SECONDS")?,
            upstream_timeout_seconds: env::var("SHROUD_UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid SHROUD_UPSTREAM_TIMEOUT_SECONDS")?,

            background_queue_size: env::var("SHROUD_BACKGROUND_QUEUE")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .context("Invalid SHROUD_BACKGROUND_QUEUE")?,
            sink_rate_per_second: env::var("SHROUD_SINK_RATE_PER_SECOND")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("Invalid SHROUD_SINK_RATE_PER_SECOND")?,
            usage_flush_ms: env::var("SHROUD_USAGE_FLUSH_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("Invalid SHROUD_USAGE_FLUSH_MS")?,

            debug_enabled: env::var("SHROUD_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }

    /// Base URL configured for a provider
    pub fn base_url_for(&self, provider: ProviderId) -> &str {
        match provider {
            ProviderId::OpenAi => &self.openai_api_url,
            ProviderId::Anthropic => &self.anthropic_api_url,
            ProviderId::DeepSeek => &self.deepseek_api_url,
            ProviderId::Gemini => &self.gemini_api_url,
        }
    }

    /// Configuration pointing every provider at one base URL (mock servers in tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing(upstream_url: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            redis_url: "redis://localhost:6379".to_string(),
            openai_api_url: upstream_url.to_string(),
            anthropic_api_url: upstream_url.to_string(),
            deepseek_api_url: upstream_url.to_string(),
            gemini_api_url: upstream_url.to_string(),
            default_provider: ProviderId::DeepSeek,
            fallback_provider: ProviderId::DeepSeek,
            fallback_api_key: None,
            encryption_key: None,
            token_ttl_seconds: 600,
            upstream_timeout_seconds: 5,
            background_queue_size: 64,
            sink_rate_per_second: 1000,
            usage_flush_ms: 20,
            debug_enabled: true,
        }
    }
}
