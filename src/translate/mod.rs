//! Protocol adapters
//!
//! Converts the canonical (OpenAI-style) chat request into each provider's native
//! request, and native responses back into the canonical shape.

pub mod anthropic;
pub mod gemini;
pub mod passthrough;

use thiserror::Error;

use crate::canonical::{CanonicalChatRequest, CanonicalChatResponse};
use crate::providers::AdapterKind;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use passthrough::PassthroughAdapter;

/// Errors that can occur during translation
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The adapter does not implement this direction
    #[error("{0} translation is not supported for this provider")]
    UnsupportedDirection(&'static str),

    /// A message role the target protocol cannot express
    #[error("Role '{0}' is not supported by this provider")]
    UnsupportedRole(&'static str),

    /// Content the target protocol cannot express
    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),

    /// Provider response did not have the expected shape
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Bidirectional translation between the canonical shape and one provider protocol
pub trait ProtocolAdapter: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &'static str;

    /// Canonical request to provider-native JSON
    fn translate_request(
        &self,
        request: &CanonicalChatRequest,
    ) -> Result<serde_json::Value, TranslationError>;

    /// Whether successful responses must be converted back to the canonical shape
    fn needs_response_translation(&self) -> bool {
        false
    }

    /// Provider-native response body to the canonical response
    fn translate_response(&self, _body: &[u8]) -> Result<CanonicalChatResponse, TranslationError> {
        Err(TranslationError::UnsupportedDirection("response"))
    }
}

static PASSTHROUGH: PassthroughAdapter = PassthroughAdapter;
static ANTHROPIC: AnthropicAdapter = AnthropicAdapter;
static GEMINI: GeminiAdapter = GeminiAdapter;

/// Adapter implementing a provider's protocol
pub fn adapter_for(kind: AdapterKind) -> &'static dyn ProtocolAdapter {
    match kind {
        AdapterKind::OpenAiCompatible => &PASSTHROUGH,
        AdapterKind::Anthropic => &ANTHROPIC,
        AdapterKind::Gemini => &GEMINI,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_lookup() {
        assert_eq!(adapter_for(AdapterKind::OpenAiCompatible).name(), "passthrough");
        assert_eq!(adapter_for(AdapterKind::Anthropic).name(), "anthropic");
        assert_eq!(adapter_for(AdapterKind::Gemini).name(), "gemini");
        assert!(adapter_for(AdapterKind::Anthropic).needs_response_translation());
        assert!(!adapter_for(AdapterKind::Gemini).needs_response_translation());
    }

    #[test]
    fn test_response_direction_unsupported_by_default() {
        let result = adapter_for(AdapterKind::OpenAiCompatible).translate_response(b"{}");
        assert!(matches!(
            result,
            Err(TranslationError::UnsupportedDirection("response"))
        ));
    }
}
