//! Integration tests for the Shroud gateway
//!
//! These tests drive the complete router (authentication, quota, redaction,
//! translation and rehydration) against a mock upstream provider.

mod chat_completions;
mod health;
mod models;
