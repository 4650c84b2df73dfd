//! Gemini adapter
//!
//! Gemini exposes an OpenAI-compatible surface, so only the model field changes:
//! deprecated aliases are rewritten and the `models/` prefix is added.

use super::{ProtocolAdapter, TranslationError};
use crate::canonical::CanonicalChatRequest;

const MODEL_PREFIX: &str = "models/";

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiAdapter;

/// Current Gemini identifier for a requested model, with the `models/` prefix
pub fn normalize_model(model: &str) -> String {
    let bare = model.strip_prefix(MODEL_PREFIX).unwrap_or(model);

    let current = match bare {
        "gemini-pro" | "gemini-1.5-pro-latest" => "gemini-1.5-pro",
        "gemini-1.5-flash-latest" => "gemini-1.5-flash",
        other => other,
    };

    format!("{}{}", MODEL_PREFIX, current)
}

impl ProtocolAdapter for GeminiAdapter {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn translate_request(
        &self,
        request: &CanonicalChatRequest,
    ) -> Result<serde_json::Value, TranslationError> {
        let mut native = serde_json::to_value(request)?;
        native["model"] = serde_json::Value::String(normalize_model(&request.model));
        Ok(native)
    }
}
