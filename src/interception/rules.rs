//! Host-matching rewrite rule
//!
//! A request to an intercepted provider host is redirected to the gateway: scheme,
//! authority and `Host` point at the gateway, provider path aliases map to the
//! gateway's versioned paths, the gateway key replaces any client credential, and
//! `Accept-Encoding` is dropped so responses stay readable.

use axum::http::header::{ACCEPT_ENCODING, AUTHORIZATION, HOST};
use axum::http::uri::{Authority, Scheme};
use axum::http::{self, HeaderValue, Request, Uri};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid gateway URL: {0}")]
    InvalidGatewayUrl(String),

    #[error("gateway API key cannot be sent as a header")]
    InvalidApiKey,

    #[error("failed to rewrite request: {0}")]
    Rewrite(#[from] http::Error),
}

/// Gateway path for a provider path
pub fn gateway_path(path: &str) -> &str {
    match path {
        "/chat/completions" => "/v1/chat/completions",
        "/models" => "/v1/models",
        other => other,
    }
}

/// Redirects traffic for a fixed set of provider hosts to the gateway
#[derive(Debug, Clone)]
pub struct InterceptRule {
    hosts: Vec<String>,
    scheme: Scheme,
    authority: Authority,
    host_header: HeaderValue,
    authorization: HeaderValue,
}

impl InterceptRule {
    pub fn new(hosts: &[String], gateway_url: &str, api_key: &str) -> Result<Self, RuleError> {
        let gateway: Uri = gateway_url
            .parse()
            .map_err(|_| RuleError::InvalidGatewayUrl(gateway_url.to_string()))?;
        let (Some(scheme), Some(authority)) =
            (gateway.scheme().cloned(), gateway.authority().cloned())
        else {
            return Err(RuleError::InvalidGatewayUrl(gateway_url.to_string()));
        };

        let host_header = HeaderValue::from_str(authority.as_str())
            .map_err(|_| RuleError::InvalidGatewayUrl(gateway_url.to_string()))?;
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| RuleError::InvalidApiKey)?;
        authorization.set_sensitive(true);

        Ok(Self {
            hosts: hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            scheme,
            authority,
            host_header,
            authorization,
        })
    }

    /// Whether traffic for `host` (with or without port) is redirected
    pub fn intercepts(&self, host: &str) -> bool {
        let bare = host.split(':').next().unwrap_or(host);
        self.hosts.iter().any(|h| h.eq_ignore_ascii_case(bare))
    }

    /// Whether `request` targets an intercepted host
    pub fn applies_to<B>(&self, request: &Request<B>) -> bool {
        let host = request.uri().host().or_else(|| {
            request
                .headers()
                .get(HOST)
                .and_then(|v| v.to_str().ok())
        });
        host.is_some_and(|h| self.intercepts(h))
    }

    /// Point `request` at the gateway
    pub fn rewrite<B>(&self, request: Request<B>) -> Result<Request<B>, RuleError> {
        let (mut parts, body) = request.into_parts();

        let path = gateway_path(parts.uri.path());
        let path_and_query = match parts.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };

        parts.uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?;

        parts.headers.insert(HOST, self.host_header.clone());
        parts.headers.insert(AUTHORIZATION, self.authorization.clone());
        parts.headers.remove(ACCEPT_ENCODING);

        Ok(Request::from_parts(parts, body))
    }

    pub fn gateway_authority(&self) -> &str {
        self.authority.as_str()
    }
}
