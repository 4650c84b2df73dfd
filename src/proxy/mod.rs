//! Proxy module
//!
//! Upstream forwarding: provider headers, the HTTP client and per-request logging.

pub mod headers;
pub mod logging;
pub mod upstream;

pub use logging::RequestContext;
pub use upstream::{UpstreamClient, UpstreamError, UpstreamResponse};
