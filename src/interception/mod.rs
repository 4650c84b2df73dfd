//! Local interception proxy
//!
//! Client-side companion of the gateway: a MITM proxy that redirects direct calls
//! to known provider hosts through the gateway. All content transformation stays
//! server-side; this module only matches hosts and rewrites destinations.

pub mod rules;
pub mod server;

pub use rules::{gateway_path, InterceptRule, RuleError};
pub use server::{run, ConnectConfig, InterceptHandler};
