//! OpenAI-compatible providers (OpenAI, DeepSeek)
//!
//! The canonical shape is the provider's own, so requests are serialized as-is.

use super::{ProtocolAdapter, TranslationError};
use crate::canonical::CanonicalChatRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAdapter;

impl ProtocolAdapter for PassthroughAdapter {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn translate_request(
        &self,
        request: &CanonicalChatRequest,
    ) -> Result<serde_json::Value, TranslationError> {
        Ok(serde_json::to_value(request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::parse_chat_request;

    #[test]
    fn test_request_passes_through() {
        let request = parse_chat_request(
            br#"{"model":"gpt-4o","messages":[{"role":"user","content":"Hi"}],"temperature":0.5,"stream":true}"#,
        )
        .unwrap();

        let out = PassthroughAdapter.translate_request(&request).unwrap();

        assert_eq!(out["model"], "gpt-4o");
        assert_eq!(out["messages"][0]["content"], "Hi");
        assert_eq!(out["temperature"], 0.5);
        assert_eq!(out["stream"], true);
    }
}
