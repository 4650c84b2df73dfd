//! Canonical chat-completion types
//!
//! The OpenAI-style request/response shape used as the pivot between clients and
//! every upstream provider. Provider-native shapes are converted to and from these
//! types by the `translate` module.

pub mod request;
pub mod response;
pub mod types;

pub use request::{parse_chat_request, CanonicalChatRequest};
pub use response::{CanonicalChatResponse, Choice, Usage};
pub use types::{ChatMessage, Content, ContentPart, ImageUrl, Role, TypedPart};
