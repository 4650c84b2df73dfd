//! Redaction module
//!
//! Replaces detected secrets with opaque `<SECRET:LABEL:ID>` placeholders before a
//! request leaves the gateway, and restores them in the provider's response.
//!
//! Detection is a regex heuristic, not a data-loss-prevention engine: it misses
//! secret shapes it has no pattern for, and flags look-alikes such as any
//! 16-digit number as a payment card.

pub mod patterns;
pub mod rehydrator;
pub mod token;
pub mod tokenizer;

pub use patterns::{PatternLibrary, SecretPattern};
pub use rehydrator::Rehydrator;
pub use token::{mask, RedactionToken, TokenIdGenerator, TokenMap};
pub use tokenizer::Tokenizer;
