//! Upstream HTTP forwarding
//!
//! One call per gateway request, no retries. The whole body is buffered so the
//! response can be translated and rehydrated before it reaches the caller.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

use super::headers::build_upstream_headers;
use super::logging::RequestContext;
use crate::providers::ProviderDescriptor;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("credential cannot be sent as a header")]
    InvalidCredential,

    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Buffered upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends translated requests to providers
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Build a client with the gateway's connection pool settings
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .timeout(timeout)
            .build()?;
        Ok(Self::new(http, timeout))
    }

    /// POST `body` to the provider's chat endpoint
    ///
    /// Non-2xx statuses are returned as responses, not errors. Dropping the returned
    /// future cancels the call.
    pub async fn send(
        &self,
        provider: &ProviderDescriptor,
        api_key: &str,
        body: Vec<u8>,
        ctx: &RequestContext,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = provider.chat_url();
        let headers = build_upstream_headers(provider.auth, api_key)
            .map_err(|_| UpstreamError::InvalidCredential)?;

        ctx.log_upstream_request(&url, body.len());

        let call = async {
            let response = self
                .http
                .post(&url)
                .headers(headers)
                .body(body)
                .send()
                .await?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?;

            Ok::<_, reqwest::Error>(UpstreamResponse {
                status,
                content_type,
                body,
            })
        };

        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                ctx.log_timeout(self.timeout.as_millis() as u64);
                return Err(UpstreamError::Timeout(self.timeout));
            }
            Ok(Err(e)) => return Err(UpstreamError::Transport(e)),
            Err(_) => {
                ctx.log_timeout(self.timeout.as_millis() as u64);
                return Err(UpstreamError::Timeout(self.timeout));
            }
        };

        ctx.log_upstream_response(response.status, response.body.len());
        Ok(response)
    }
}
