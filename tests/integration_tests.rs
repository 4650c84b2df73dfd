//! Integration tests entry point for the Shroud gateway
//!
//! Run these tests using `cargo test --features test-utils --test integration_tests`.

mod common;
mod integration;

// Tests are defined within the integration module:
// - integration/health.rs - Health endpoint tests
// - integration/models.rs - Models endpoint tests
// - integration/chat_completions.rs - Redacting chat proxy tests
