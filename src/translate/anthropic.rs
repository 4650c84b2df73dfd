//! Anthropic Messages API adapter
//!
//! Anthropic keeps the system prompt in a top-level `system` field and requires
//! `max_tokens`. Responses carry a list of content blocks and a `stop_reason`
//! instead of OpenAI's `choices`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ProtocolAdapter, TranslationError};
use crate::canonical::{
    CanonicalChatRequest, CanonicalChatResponse, ChatMessage, Choice, Role, Usage,
};

/// Used when the canonical request leaves `max_tokens` unset
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<MessagesMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Map short model aliases to versioned Anthropic identifiers
pub fn resolve_model_alias(model: &str) -> &str {
    match model {
        "claude-3-5-sonnet" => "claude-3-5-sonnet-latest",
        "claude-3-opus" => "claude-3-opus-latest",
        "claude-3-sonnet" => "claude-3-sonnet-20240229",
        "claude-3-haiku" => "claude-3-haiku-20240307",
        other => other,
    }
}

/// Split system messages out of the conversation
///
/// System texts are joined with newlines; the remaining messages keep their order.
pub fn extract_system_prompt(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let mut system_texts = Vec::new();
    let mut rest = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system_texts.push(message.text_content()),
            _ => rest.push(message),
        }
    }

    let system = if system_texts.is_empty() {
        None
    } else {
        Some(system_texts.join("\n"))
    };

    (system, rest)
}

/// Anthropic stop reason to canonical finish reason
pub fn translate_stop_reason(reason: Option<&str>) -> &'static str {
    match reason {
        Some("max_tokens") => "length",
        _ => "stop",
    }
}

impl ProtocolAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn translate_request(
        &self,
        request: &CanonicalChatRequest,
    ) -> Result<serde_json::Value, TranslationError> {
        let (system, rest) = extract_system_prompt(&request.messages);

        let messages = rest
            .into_iter()
            .map(|message| {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => return Err(TranslationError::UnsupportedRole("tool")),
                    Role::System => return Err(TranslationError::UnsupportedRole("system")),
                };
                Ok(MessagesMessage {
                    role,
                    content: message.text_content(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let native = MessagesRequest {
            model: resolve_model_alias(&request.model),
            messages,
            system,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        Ok(serde_json::to_value(native)?)
    }

    fn needs_response_translation(&self) -> bool {
        true
    }

    fn translate_response(&self, body: &[u8]) -> Result<CanonicalChatResponse, TranslationError> {
        let native: MessagesResponse = serde_json::from_slice(body)
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;

        let text = native
            .content
            .first()
            .and_then(|block| block.text.clone())
            .unwrap_or_default();

        Ok(CanonicalChatResponse {
            id: native.id,
            object: "chat.completion".to_string(),
            created: Utc::now().timestamp(),
            model: native.model,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::text(Role::Assistant, text),
                finish_reason: Some(
                    translate_stop_reason(native.stop_reason.as_deref()).to_string(),
                ),
            }],
            usage: Usage {
                prompt_tokens: native.usage.input_tokens,
                completion_tokens: native.usage.output_tokens,
                total_tokens: native.usage.input_tokens + native.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::parse_chat_request;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CanonicalChatRequest {
        parse_chat_request(body.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_system_prompt_extracted() {
        let canonical = request(json!({
            "model": "claude-3-opus",
            "messages": [
                {"role": "system", "content": "You are helpful"},
                {"role": "user", "content": "Hi"}
            ]
        }));

        let native = AnthropicAdapter.translate_request(&canonical).unwrap();

        assert_eq!(native["system"], "You are helpful");
        assert_eq!(native["messages"], json!([{"role": "user", "content": "Hi"}]));
        assert_eq!(native["model"], "claude-3-opus-latest");
        assert_eq!(native["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!(native.get("stream").is_none());
    }

    #[test]
    fn test_multiple_system_messages_joined() {
        let canonical = request(json!({
            "model": "claude-3-haiku",
            "max_tokens": 64,
            "messages": [
                {"role": "system", "content": "First"},
                {"role": "user", "content": "Hi"},
                {"role": "system", "content": "Second"}
            ]
        }));

        let native = AnthropicAdapter.translate_request(&canonical).unwrap();

        assert_eq!(native["system"], "First\nSecond");
        assert_eq!(native["max_tokens"], 64);
        assert_eq!(native["model"], "claude-3-haiku-20240307");
    }

    #[test]
    fn test_no_system_field_without_system_messages() {
        let canonical = request(json!({
            "model": "claude-3-haiku-20240307",
            "messages": [{"role": "user", "content": "Hi"}]
        }));

        let native = AnthropicAdapter.translate_request(&canonical).unwrap();

        assert!(native.get("system").is_none());
        assert_eq!(native["model"], "claude-3-haiku-20240307");
    }

    #[test]
    fn test_tool_messages_rejected() {
        let canonical = request(json!({
            "model": "claude-3-opus",
            "messages": [{"role": "tool", "content": "42"}]
        }));

        assert!(matches!(
            AnthropicAdapter.translate_request(&canonical),
            Err(TranslationError::UnsupportedRole("tool"))
        ));
    }

    #[test]
    fn test_response_translation() {
        let body = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-opus-latest",
            "content": [{"type": "text", "text": "Hello!"}, {"type": "text", "text": "ignored"}],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });

        let canonical = AnthropicAdapter
            .translate_response(body.to_string().as_bytes())
            .unwrap();

        assert_eq!(canonical.id, "msg_1");
        assert_eq!(canonical.object, "chat.completion");
        assert_eq!(canonical.choices.len(), 1);
        assert_eq!(canonical.choices[0].index, 0);
        assert_eq!(canonical.choices[0].message.role, Role::Assistant);
        assert_eq!(canonical.choices[0].message.text_content(), "Hello!");
        assert_eq!(canonical.choices[0].finish_reason.as_deref(), Some("length"));
        assert_eq!(
            canonical.usage,
            Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15
            }
        );
    }

    #[test]
    fn test_stop_reasons() {
        assert_eq!(translate_stop_reason(Some("max_tokens")), "length");
        assert_eq!(translate_stop_reason(Some("end_turn")), "stop");
        assert_eq!(translate_stop_reason(Some("tool_use")), "stop");
        assert_eq!(translate_stop_reason(None), "stop");
    }

    #[test]
    fn test_malformed_response_is_an_error() {
        assert!(matches!(
            AnthropicAdapter.translate_response(b"<html>bad gateway</html>"),
            Err(TranslationError::InvalidResponse(_))
        ));
    }
}
