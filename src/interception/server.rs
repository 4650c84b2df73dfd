//! MITM proxy server
//!
//! Only CONNECT tunnels to intercepted hosts are decrypted, using leaf certificates
//! minted from a locally trusted CA. Everything else is tunnelled untouched.

use std::env;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use hudsucker::{
    certificate_authority::RcgenAuthority,
    hyper::{Request, Response, StatusCode},
    rcgen::{CertificateParams, KeyPair},
    rustls::crypto::aws_lc_rs,
    Body, HttpContext, HttpHandler, Proxy, RequestOrResponse,
};
use tracing::{debug, error, info};

use super::rules::InterceptRule;

/// Leaf certificates kept in memory
const CERT_CACHE_SIZE: u64 = 1_000;

/// Configuration for the local interception proxy
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Local port to listen on (loopback only)
    pub port: u16,
    /// Gateway base URL requests are redirected to
    pub gateway_url: String,
    /// Gateway-issued API key injected into redirected requests
    pub api_key: String,
    /// Provider hosts to intercept
    pub intercept_hosts: Vec<String>,
    /// PEM file of the locally trusted CA certificate
    pub ca_cert_path: PathBuf,
    /// PEM file of the CA private key
    pub ca_key_path: PathBuf,
}

impl ConnectConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: var("SHROUD_CONNECT_PORT")
                .unwrap_or_else(|| "8888".to_string())
                .parse()
                .context("Invalid SHROUD_CONNECT_PORT")?,
            gateway_url: var("SHROUD_GATEWAY_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            api_key: var("SHROUD_API_KEY").context("SHROUD_API_KEY must be set")?,
            intercept_hosts: var("SHROUD_INTERCEPT_HOSTS")
                .unwrap_or_else(|| "api.deepseek.com".to_string())
                .split(',')
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
            ca_cert_path: var("SHROUD_CA_CERT")
                .context("SHROUD_CA_CERT must point to the CA certificate")?
                .into(),
            ca_key_path: var("SHROUD_CA_KEY")
                .context("SHROUD_CA_KEY must point to the CA private key")?
                .into(),
        })
    }
}

/// Redirects requests for intercepted hosts to the gateway
#[derive(Clone)]
pub struct InterceptHandler {
    rule: Arc<InterceptRule>,
}

impl InterceptHandler {
    pub fn new(rule: InterceptRule) -> Self {
        Self {
            rule: Arc::new(rule),
        }
    }
}

impl HttpHandler for InterceptHandler {
    async fn handle_request(
        &mut self,
        _ctx: &HttpContext,
        request: Request<Body>,
    ) -> RequestOrResponse {
        if !self.rule.applies_to(&request) {
            return request.into();
        }

        let original = format!(
            "{}{}",
            request.uri().host().unwrap_or_default(),
            request.uri().path()
        );

        match self.rule.rewrite(request) {
            Ok(rewritten) => {
                info!(
                    from = %original,
                    to = %rewritten.uri(),
                    "Redirecting provider request to gateway"
                );
                rewritten.into()
            }
            Err(e) => {
                error!(from = %original, error = %e, "Failed to redirect request");
                let mut response =
                    Response::new(Body::from("shroud-connect: request rewrite failed"));
                *response.status_mut() = StatusCode::BAD_GATEWAY;
                response.into()
            }
        }
    }

    async fn should_intercept(&mut self, _ctx: &HttpContext, request: &Request<Body>) -> bool {
        let intercept = request
            .uri()
            .host()
            .is_some_and(|host| self.rule.intercepts(host));
        debug!(uri = %request.uri(), intercept, "CONNECT request");
        intercept
    }
}

async fn load_authority(config: &ConnectConfig) -> Result<RcgenAuthority> {
    let key_pem = tokio::fs::read_to_string(&config.ca_key_path)
        .await
        .with_context(|| format!("Failed to read {}", config.ca_key_path.display()))?;
    let cert_pem = tokio::fs::read_to_string(&config.ca_cert_path)
        .await
        .with_context(|| format!("Failed to read {}", config.ca_cert_path.display()))?;

    let key_pair = KeyPair::from_pem(&key_pem).context("Failed to parse CA private key")?;
    let ca_cert = CertificateParams::from_ca_cert_pem(&cert_pem)
        .context("Failed to parse CA certificate")?
        .self_signed(&key_pair)
        .context("Failed to sign CA certificate")?;

    Ok(RcgenAuthority::new(
        key_pair,
        ca_cert,
        CERT_CACHE_SIZE,
        aws_lc_rs::default_provider(),
    ))
}

/// Run the proxy until `shutdown` resolves
pub async fn run<F>(config: ConnectConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let rule = InterceptRule::new(&config.intercept_hosts, &config.gateway_url, &config.api_key)
        .context("Invalid interception rule")?;
    let ca = load_authority(&config).await?;

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!(
        %addr,
        gateway = %rule.gateway_authority(),
        hosts = ?config.intercept_hosts,
        "Shroud Connect listening"
    );

    let proxy = Proxy::builder()
        .with_addr(addr)
        .with_ca(ca)
        .with_rustls_client(aws_lc_rs::default_provider())
        .with_http_handler(InterceptHandler::new(rule))
        .with_graceful_shutdown(shutdown)
        .build()
        .context("Failed to build proxy")?;

    proxy.start().await.context("Proxy stopped with an error")?;

    info!("Shroud Connect stopped");
    Ok(())
}
