//! Core message types
//!
//! Roles, content and messages shared by canonical requests and responses.

use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing instructions or context
    System,
    /// User message from the human
    User,
    /// Assistant message from the AI
    Assistant,
    /// Tool/function result message
    Tool,
}

/// Image URL reference for multimodal content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    /// URL of the image (can be data URL or HTTP URL)
    pub url: String,
    /// Image detail level: "auto", "low", or "high"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A content part the gateway interprets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypedPart {
    /// Text content
    Text {
        /// The text content
        text: String,
    },
    /// Image URL reference
    ImageUrl {
        /// The image URL details
        image_url: ImageUrl,
    },
}

/// A part of multimodal content
///
/// Part types the gateway does not know (`input_audio`, `file`, ...) are kept as
/// raw JSON and forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentPart {
    Typed(TypedPart),
    Other(serde_json::Value),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Typed(TypedPart::Text { text: text.into() })
    }
}

/// Message content - either plain text or multimodal parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    /// Simple text content
    Text(String),
    /// Multimodal content with text, images or other parts
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Extract text content from either variant
    ///
    /// For `Text` variant, returns the string directly.
    /// For `Parts` variant, concatenates all text parts.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Typed(TypedPart::Text { text }) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Apply a rewrite to every text fragment, leaving other parts untouched
    pub fn map_text<F>(&mut self, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        match self {
            Content::Text(text) => *text = f(text),
            Content::Parts(parts) => {
                for part in parts.iter_mut() {
                    if let ContentPart::Typed(TypedPart::Text { text }) = part {
                        *text = f(text);
                    }
                }
            }
        }
    }
}

/// A chat message with role and content
///
/// Fields the gateway does not interpret (`name`, `tool_calls`, ...) ride along in
/// `extra` so they reach OpenAI-compatible providers unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// The role of the message author
    pub role: Role,
    /// The content of the message
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatMessage {
    /// Build a plain-text message
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(Content::Text(text.into())),
            extra: serde_json::Map::new(),
        }
    }

    /// Text of the message, empty when there is no content
    pub fn text_content(&self) -> String {
        self.content.as_ref().map(Content::as_text).unwrap_or_default()
    }
}
