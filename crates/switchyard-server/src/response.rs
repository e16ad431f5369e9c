//! Response construction.
//!
//! A handler influences the response in two ways:
//!
//! - by writing to the injected [`ResponseDraft`] (status, headers, body), and
//! - by returning something that implements [`IntoReply`].
//!
//! The returned [`Reply`] wins over the draft for whatever it sets; anything it
//! leaves unset falls back to the draft.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use switchyard_server::{IntoReply, Reply, ResponseDraft};
//!
//! let draft = ResponseDraft::new();
//! draft.set_status(StatusCode::ACCEPTED);
//! draft.write("queued");
//!
//! let response = ().into_reply().finish(&draft);
//! assert_eq!(response.status(), StatusCode::ACCEPTED);
//! ```

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;
use serde::Serialize;
use switchyard_core::{ErrorEnvelope, HandlerError, HandlerResult};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";

#[derive(Debug, Default)]
struct DraftState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

/// A response under construction, shared with the handler.
///
/// Clones refer to the same draft. A draft lives for one dispatch.
#[derive(Debug, Clone, Default)]
pub struct ResponseDraft {
    inner: Arc<Mutex<DraftState>>,
}

impl ResponseDraft {
    /// Creates an empty draft (status `200`, no headers, empty body).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    pub fn set_status(&self, status: StatusCode) {
        self.inner.lock().status = Some(status);
    }

    /// Returns the status code, `200` unless set.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.lock().status.unwrap_or(StatusCode::OK)
    }

    /// Inserts a header, replacing any previous value.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.lock().headers.insert(name, value);
    }

    /// Inserts a header from strings.
    ///
    /// # Errors
    ///
    /// Returns a `HandlerError` if the name or value is not a valid header.
    #[track_caller]
    pub fn try_header(&self, name: &str, value: &str) -> HandlerResult<()> {
        let name = HeaderName::try_from(name)
            .map_err(|e| HandlerError::with_source(format!("invalid header name '{name}'"), e))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| HandlerError::with_source("invalid header value", e))?;
        self.insert_header(name, value);
        Ok(())
    }

    /// Returns a header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    }

    /// Appends to the body.
    pub fn write(&self, chunk: impl AsRef<[u8]>) {
        self.inner.lock().body.extend_from_slice(chunk.as_ref());
    }

    /// Replaces the body.
    pub fn set_body(&self, body: impl AsRef<[u8]>) {
        let mut state = self.inner.lock();
        state.body.clear();
        state.body.extend_from_slice(body.as_ref());
    }

    /// Returns a copy of the body written so far.
    #[must_use]
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.inner.lock().body)
    }
}

/// The value a handler returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    status: Option<StatusCode>,
    content_type: Option<HeaderValue>,
    body: Option<Bytes>,
}

impl Reply {
    /// A reply that leaves the draft untouched.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A `text/plain` reply.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: None,
            content_type: Some(HeaderValue::from_static(TEXT)),
            body: Some(Bytes::from(body.into())),
        }
    }

    /// A `text/html` reply.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: None,
            content_type: Some(HeaderValue::from_static(HTML)),
            body: Some(Bytes::from(body.into())),
        }
    }

    /// An `application/json` reply.
    ///
    /// # Errors
    ///
    /// Returns a `HandlerError` if `value` cannot be serialized.
    #[track_caller]
    pub fn json<T: Serialize + ?Sized>(value: &T) -> HandlerResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self {
            status: None,
            content_type: Some(HeaderValue::from_static(JSON)),
            body: Some(Bytes::from(body)),
        })
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the status code, if set.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the body, if set.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Merges this reply with the draft into the final response.
    #[must_use]
    pub fn finish(self, draft: &ResponseDraft) -> HttpResponse {
        let state = std::mem::take(&mut *draft.inner.lock());

        let status = self.status.or(state.status).unwrap_or(StatusCode::OK);
        let mut headers = state.headers;
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        let body = self.body.unwrap_or_else(|| state.body.freeze());

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

/// Conversion of handler return values into a [`Reply`].
pub trait IntoReply {
    /// Performs the conversion.
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::empty()
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Reply::text(self)
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply {
        Reply::text(self)
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Reply {
        Reply {
            status: None,
            content_type: Some(HeaderValue::from_static(JSON)),
            body: Some(Bytes::from(self.to_string())),
        }
    }
}

impl IntoReply for StatusCode {
    fn into_reply(self) -> Reply {
        Reply::empty().with_status(self)
    }
}

impl<R: IntoReply> IntoReply for (StatusCode, R) {
    fn into_reply(self) -> Reply {
        self.1.into_reply().with_status(self.0)
    }
}

/// Builds a JSON error response from an envelope.
#[must_use]
pub fn error_response(status: StatusCode, envelope: &ErrorEnvelope) -> HttpResponse {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| {
        br#"{"error":{"code":"INTERNAL_ERROR","message":"Internal server error"}}"#.to_vec()
    });

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_draft_used_when_reply_empty() {
        let draft = ResponseDraft::new();
        draft.set_status(StatusCode::CREATED);
        draft.try_header("x-trace", "abc").unwrap();
        draft.write("hello ");
        draft.write("world");

        let response = Reply::empty().finish(&draft);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert_eq!(body_of(response).await, "hello world");
    }

    #[tokio::test]
    async fn test_reply_overrides_draft() {
        let draft = ResponseDraft::new();
        draft.set_status(StatusCode::CREATED);
        draft.write("ignored");

        let response = (StatusCode::ACCEPTED, "done").into_reply().finish(&draft);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT);
        assert_eq!(body_of(response).await, "done");
    }

    #[tokio::test]
    async fn test_json_reply() {
        let reply = Reply::json(&serde_json::json!({ "id": 42 })).unwrap();
        let response = reply.finish(&ResponseDraft::new());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON);
        assert_eq!(body_of(response).await, r#"{"id":42}"#);
    }

    #[test]
    fn test_status_into_reply() {
        let reply = StatusCode::NO_CONTENT.into_reply();
        assert_eq!(reply.status(), Some(StatusCode::NO_CONTENT));
        assert!(reply.body().is_none());
    }

    #[test]
    fn test_invalid_header_is_error() {
        let draft = ResponseDraft::new();
        assert!(draft.try_header("bad header", "x").is_err());
        assert!(draft.header("bad header").is_none());
    }

    #[test]
    fn test_draft_clones_share_state() {
        let draft = ResponseDraft::new();
        let clone = draft.clone();
        clone.set_body("shared");
        assert_eq!(draft.body(), "shared");
    }
}
