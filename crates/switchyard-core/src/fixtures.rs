//! Test fixtures for Switchyard development and testing.
//!
//! This module provides in-memory collaborators and request builders that are
//! used in tests across the Switchyard codebase.
//!
//! # Example
//!
//! ```
//! use switchyard_core::fixtures::{self, MemorySink};
//! use switchyard_core::RecordSink;
//!
//! let sink = MemorySink::new();
//! sink.record("validation", &serde_json::json!({ "field": "id" })).unwrap();
//! assert_eq!(sink.categories(), vec!["validation".to_string()]);
//!
//! let ctx = fixtures::get("/users/42?verbose=1");
//! assert_eq!(ctx.path(), "/users/42");
//! ```

use crate::{RecordError, RecordSink, RequestContext};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, Uri};
use parking_lot::Mutex;

/// A record captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Failure category.
    pub category: String,
    /// Structured payload.
    pub payload: serde_json::Value,
}

/// Record sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Returns the recorded categories in order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.category.clone())
            .collect()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RecordSink for MemorySink {
    fn record(&self, category: &str, payload: &serde_json::Value) -> Result<(), RecordError> {
        self.records.lock().push(Record {
            category: category.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }
}

/// Record sink that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl RecordSink for FailingSink {
    fn record(&self, _category: &str, _payload: &serde_json::Value) -> Result<(), RecordError> {
        Err(RecordError::new("sink unavailable"))
    }
}

/// Record sink that panics on every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingSink;

impl RecordSink for PanickingSink {
    fn record(&self, category: &str, _payload: &serde_json::Value) -> Result<(), RecordError> {
        panic!("record sink exploded on {category}");
    }
}

/// Builds a request context with no headers and an empty body.
///
/// # Panics
///
/// Panics if `uri` is not a valid URI.
#[must_use]
pub fn request(method: Method, uri: &str) -> RequestContext {
    let uri: Uri = uri.parse().expect("fixture URI must be valid");
    RequestContext::new(method, uri, HeaderMap::new(), Bytes::new())
}

/// Builds a `GET` request context.
#[must_use]
pub fn get(uri: &str) -> RequestContext {
    request(Method::GET, uri)
}

/// Builds a request context carrying a JSON body.
#[must_use]
pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> RequestContext {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    with_body(method, uri, headers, Bytes::from(body.to_string()))
}

/// Builds a request context carrying a form-encoded body.
#[must_use]
pub fn form_request(method: Method, uri: &str, body: &str) -> RequestContext {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    with_body(method, uri, headers, Bytes::from(body.to_string()))
}

fn with_body(method: Method, uri: &str, headers: HeaderMap, body: Bytes) -> RequestContext {
    let uri: Uri = uri.parse().expect("fixture URI must be valid");
    RequestContext::new(method, uri, headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.record("csrf", &serde_json::json!({})).unwrap();
        sink.record("handler", &serde_json::json!({})).unwrap();
        assert_eq!(sink.categories(), vec!["csrf", "handler"]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_failing_sink() {
        assert!(FailingSink.record("csrf", &serde_json::json!({})).is_err());
    }

    #[test]
    fn test_json_request_sets_content_type() {
        let ctx = json_request(Method::POST, "/users", &serde_json::json!({ "name": "ada" }));
        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.body().as_ref(), br#"{"name":"ada"}"#);
    }

    #[test]
    fn test_form_request() {
        let ctx = form_request(Method::POST, "/login", "user=ada&_token=abc");
        assert_eq!(
            ctx.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }
}
