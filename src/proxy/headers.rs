//! Header utilities for upstream provider requests
//!
//! Client headers are never forwarded: the upstream only sees the content type and
//! the credential resolved for the tenant.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::providers::AuthScheme;
use crate::translate::anthropic::ANTHROPIC_VERSION;

const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
const ANTHROPIC_VERSION_HEADER: HeaderName = HeaderName::from_static("anthropic-version");

/// Request header carrying the playground debug flag
pub const DEBUG_REQUEST_HEADER: &str = "x-shroud-debug";
/// Response header echoing the redacted outbound body
pub const REDACTED_CONTENT_HEADER: &str = "x-shroud-redacted-content";

/// Build headers for an upstream call
///
/// Fails when the credential contains bytes that cannot appear in a header.
pub fn build_upstream_headers(
    auth: AuthScheme,
    api_key: &str,
) -> Result<HeaderMap, reqwest::header::InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    match auth {
        AuthScheme::Bearer => {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        AuthScheme::AnthropicKey => {
            let mut value = HeaderValue::from_str(api_key)?;
            value.set_sensitive(true);
            headers.insert(X_API_KEY, value);
            headers.insert(
                ANTHROPIC_VERSION_HEADER,
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
        }
    }

    Ok(headers)
}
