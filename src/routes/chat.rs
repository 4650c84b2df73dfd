//! Chat completions endpoint
//!
//! OpenAI-compatible chat completions API endpoint. The body is handed to the
//! gateway untouched; the response mirrors the upstream status and content type.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Extension,
};
use tracing::warn;

use crate::{
    error::AppError,
    gateway::CallerContext,
    middleware::auth::AuthenticatedTenant,
    proxy::headers::{DEBUG_REQUEST_HEADER, REDACTED_CONTENT_HEADER},
    AppState,
};

/// First address in `X-Forwarded-For`
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn wants_debug(headers: &HeaderMap) -> bool {
    headers
        .get(DEBUG_REQUEST_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Chat completions handler
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Extension(tenant): Extension<AuthenticatedTenant>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let caller = CallerContext {
        tenant_id: tenant.tenant_id,
        client_ip: client_ip(&headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        debug: wants_debug(&headers),
    };

    let result = state.gateway.handle_chat(&caller, &body).await?;

    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, result.content_type.as_str());

    if let Some(redacted) = result.redacted_request {
        match HeaderValue::from_bytes(redacted.as_bytes()) {
            Ok(value) => builder = builder.header(REDACTED_CONTENT_HEADER, value),
            Err(_) => warn!("Redacted request cannot be sent as a header, skipping debug echo"),
        }
    }

    builder
        .body(Body::from(result.body))
        .map_err(|e| AppError::Internal(e.into()))
}
