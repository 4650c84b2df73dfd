//! Request logging utilities
//!
//! Structured logging with a short correlation id, carried through every stage of
//! one gateway request.

use std::time::Instant;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

/// Context for tracking a request through the gateway
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Tenant that owns the request
    pub tenant_id: String,
    /// Upstream provider, once resolved
    pub provider: Option<String>,
    /// Requested model, once parsed
    pub model: Option<String>,
    /// Whether the caller asked for a streamed response
    pub streaming: bool,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(tenant_id: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            tenant_id: tenant_id.to_string(),
            provider: None,
            model: None,
            streaming: false,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Log request initiation
    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            tenant_id = %self.tenant_id,
            provider = ?self.provider,
            model = ?self.model,
            streaming = %self.streaming,
            "Request started"
        );
    }

    /// Log how many secrets were replaced before forwarding
    pub fn log_redaction(&self, redact_count: usize) {
        debug!(
            trace_id = %self.trace_id,
            redact_count = %redact_count,
            "Request redacted"
        );
    }

    /// Log request being sent to upstream
    pub fn log_upstream_request(&self, url: &str, body_size: usize) {
        debug!(
            trace_id = %self.trace_id,
            provider = ?self.provider,
            url = %url,
            body_size = %body_size,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16, content_length: usize) {
        info!(
            trace_id = %self.trace_id,
            provider = ?self.provider,
            status = %status,
            content_length = %content_length,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log a response that could not be converted to the canonical shape
    pub fn log_translation_failure(&self, error: &str) {
        warn!(
            trace_id = %self.trace_id,
            provider = ?self.provider,
            error = %error,
            "Response translation failed, returning raw upstream body"
        );
    }

    /// Log request completion
    pub fn log_request_complete(&self, status: u16, tokens: Option<u64>) {
        info!(
            trace_id = %self.trace_id,
            tenant_id = %self.tenant_id,
            provider = ?self.provider,
            model = ?self.model,
            status = %status,
            tokens = ?tokens,
            elapsed_ms = %self.elapsed_ms(),
            "Request completed"
        );
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            tenant_id = %self.tenant_id,
            provider = ?self.provider,
            model = ?self.model,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Log timeout
    pub fn log_timeout(&self, timeout_ms: u64) {
        error!(
            trace_id = %self.trace_id,
            provider = ?self.provider,
            timeout_ms = %timeout_ms,
            elapsed_ms = %self.elapsed_ms(),
            "Upstream request timed out"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "gateway_request",
            trace_id = %self.trace_id,
            tenant_id = %self.tenant_id,
        )
    }
}
