//! Middleware module
//!
//! Contains Tower middleware for gateway API-key authentication.

pub mod auth;

pub use auth::{ApiKeyRecord, ApiKeyStore, AuthenticatedTenant, RedisApiKeyStore};
