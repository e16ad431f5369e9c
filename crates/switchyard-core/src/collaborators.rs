//! Narrow interfaces to collaborators outside the dispatch pipeline.
//!
//! Sessions and persistent logging live elsewhere. The dispatcher only needs
//! two capabilities from them:
//!
//! - [`TokenStore`] answers whether a CSRF token is currently valid.
//! - [`RecordSink`] receives a structured record for every request-time
//!   failure.

use parking_lot::RwLock;
use std::collections::HashSet;
use thiserror::Error;

/// Validates CSRF tokens against the session layer.
pub trait TokenStore: Send + Sync + 'static {
    /// Returns `true` if `token` is valid for the current session.
    fn is_valid_token(&self, token: &str) -> bool;
}

/// In-memory token store.
///
/// Suitable for tests and single-process deployments that issue tokens
/// themselves.
///
/// # Example
///
/// ```
/// use switchyard_core::{MemoryTokenStore, TokenStore};
///
/// let store = MemoryTokenStore::new();
/// store.issue("secret");
/// assert!(store.is_valid_token("secret"));
/// assert!(!store.is_valid_token("forged"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashSet<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that accepts the given tokens.
    #[must_use]
    pub fn with_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: RwLock::new(tokens.into_iter().map(Into::into).collect()),
        }
    }

    /// Marks a token as valid.
    pub fn issue(&self, token: impl Into<String>) {
        self.tokens.write().insert(token.into());
    }

    /// Revokes a token. Returns `true` if it was present.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().remove(token)
    }
}

impl TokenStore for MemoryTokenStore {
    fn is_valid_token(&self, token: &str) -> bool {
        !token.is_empty() && self.tokens.read().contains(token)
    }
}

/// Error returned by a [`RecordSink`].
#[derive(Error, Debug)]
#[error("record sink failed: {message}")]
pub struct RecordError {
    message: String,
}

impl RecordError {
    /// Creates a record error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives structured failure records.
///
/// Categories are `validation`, `csrf`, `middleware` and `handler`. The
/// dispatcher ignores both errors and panics raised by a sink.
pub trait RecordSink: Send + Sync + 'static {
    /// Records one failure.
    fn record(&self, category: &str, payload: &serde_json::Value) -> Result<(), RecordError>;
}

/// Record sink that emits a `tracing` event per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn record(&self, category: &str, payload: &serde_json::Value) -> Result<(), RecordError> {
        tracing::warn!(
            target: "switchyard::record",
            category = %category,
            payload = %payload,
            "request failure recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_token_store() {
        let store = MemoryTokenStore::with_tokens(["a", "b"]);
        assert!(store.is_valid_token("a"));
        assert!(store.revoke("a"));
        assert!(!store.is_valid_token("a"));
        assert!(store.is_valid_token("b"));
    }

    #[test]
    fn test_empty_token_never_valid() {
        let store = MemoryTokenStore::with_tokens([""]);
        assert!(!store.is_valid_token(""));
    }

    #[test]
    fn test_tracing_sink_accepts_records() {
        let sink = TracingSink;
        let payload = serde_json::json!({ "field": "id" });
        assert!(sink.record("validation", &payload).is_ok());
    }
}
