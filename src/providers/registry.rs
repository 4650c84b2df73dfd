//! Provider registry
//!
//! Each provider is a descriptor: where it lives, how it authenticates, which models
//! it serves and which protocol adapter speaks to it. Adding a provider is a new
//! descriptor, not new control flow.

use super::ProviderId;
use crate::config::Config;

/// How the upstream expects its API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `x-api-key: <key>` plus a pinned `anthropic-version`
    AnthropicKey,
}

/// Protocol adapter used to talk to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Canonical request and response bodies go through unchanged
    OpenAiCompatible,
    /// Anthropic Messages API
    Anthropic,
    /// Gemini's OpenAI-compatibility surface (model rewriting only)
    Gemini,
}

/// Static knowledge about one provider
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub base_url: String,
    pub chat_path: &'static str,
    pub auth: AuthScheme,
    pub models: &'static [&'static str],
    pub adapter: AdapterKind,
}

impl ProviderDescriptor {
    /// Full chat endpoint URL
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.chat_path)
    }

    pub fn supports(&self, model: &str) -> bool {
        self.models.contains(&model)
    }
}

const OPENAI_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-3.5-turbo",
    "o1-preview",
    "o1-mini",
];

const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-opus",
    "claude-3-sonnet",
    "claude-3-5-sonnet",
    "claude-3-haiku",
    "claude-3-haiku-20240307",
];

const DEEPSEEK_MODELS: &[&str] = &["deepseek-chat", "deepseek-coder", "deepseek-reasoner"];

const GEMINI_MODELS: &[&str] = &[
    "gemini-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro-latest",
    "models/gemini-pro",
    "models/gemini-1.5-flash",
    "models/gemini-1.5-pro",
    "models/gemini-1.5-flash-latest",
    "models/gemini-1.5-pro-latest",
];

/// Registry of provider descriptors keyed by identity
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
    default_provider: ProviderId,
}

impl ProviderRegistry {
    /// Build the registry from configured base URLs
    pub fn from_config(config: &Config) -> Self {
        let descriptor = |id: ProviderId,
                          chat_path: &'static str,
                          auth: AuthScheme,
                          models: &'static [&'static str],
                          adapter: AdapterKind| ProviderDescriptor {
            id,
            base_url: config.base_url_for(id).to_string(),
            chat_path,
            auth,
            models,
            adapter,
        };

        Self::new(
            vec![
                descriptor(
                    ProviderId::OpenAi,
                    "/chat/completions",
                    AuthScheme::Bearer,
                    OPENAI_MODELS,
                    AdapterKind::OpenAiCompatible,
                ),
                descriptor(
                    ProviderId::Anthropic,
                    "/messages",
                    AuthScheme::AnthropicKey,
                    ANTHROPIC_MODELS,
                    AdapterKind::Anthropic,
                ),
                descriptor(
                    ProviderId::DeepSeek,
                    "/chat/completions",
                    AuthScheme::Bearer,
                    DEEPSEEK_MODELS,
                    AdapterKind::OpenAiCompatible,
                ),
                descriptor(
                    ProviderId::Gemini,
                    "/chat/completions",
                    AuthScheme::Bearer,
                    GEMINI_MODELS,
                    AdapterKind::Gemini,
                ),
            ],
            config.default_provider,
        )
    }

    pub fn new(providers: Vec<ProviderDescriptor>, default_provider: ProviderId) -> Self {
        Self {
            providers,
            default_provider,
        }
    }

    /// Provider that claims `model` by exact match, if any
    pub fn resolve_provider(&self, model: &str) -> Option<ProviderId> {
        self.providers
            .iter()
            .find(|p| p.supports(model))
            .map(|p| p.id)
    }

    /// Provider for `model`, falling back to the configured default
    pub fn resolve_or_default(&self, model: &str) -> ProviderId {
        self.resolve_provider(model).unwrap_or(self.default_provider)
    }

    pub fn get(&self, id: ProviderId) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter()
    }

    pub fn default_provider(&self) -> ProviderId {
        self.default_provider
    }
}
