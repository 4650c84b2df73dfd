//! Canonical chat completion request
//!
//! Inbound bodies are pre-validated against a JSON Schema before being bound to
//! the typed request, so bodies missing required fields are rejected before any
//! processing begins.

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::types::{ChatMessage, Role};
use crate::error::{AppError, AppResult};

/// Chat completion request in the canonical (OpenAI-style) shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalChatRequest {
    /// Requested model identifier
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    // Pass through any extra fields (temperature, tools, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CanonicalChatRequest {
    /// Whether the caller asked for a streamed response
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Prepend a system message to the conversation
    pub fn prepend_system(&mut self, text: &str) {
        self.messages.insert(0, ChatMessage::text(Role::System, text));
    }
}

static REQUEST_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema = json!({
        "type": "object",
        "required": ["model", "messages"],
        "properties": {
            "model": { "type": "string", "minLength": 1 },
            "messages": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["role"],
                    "properties": {
                        "role": { "enum": ["system", "user", "assistant", "tool"] }
                    }
                }
            },
            "max_tokens": { "type": ["integer", "null"], "minimum": 1 },
            "stream": { "type": ["boolean", "null"] }
        }
    });
    jsonschema::draft202012::new(&schema).expect("request schema is valid")
});

/// Parse and validate an inbound chat completion body
pub fn parse_chat_request(body: &[u8]) -> AppResult<CanonicalChatRequest> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| AppError::MalformedRequest("Invalid JSON".to_string()))?;

    REQUEST_SCHEMA
        .validate(&value)
        .map_err(|e| AppError::MalformedRequest(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| AppError::MalformedRequest(e.to_string()))
}
