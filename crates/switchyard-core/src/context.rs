//! Request context types.
//!
//! The [`RequestContext`] carries the per-request state that middleware and
//! handlers observe. It is built once by the dispatcher and never shared
//! between requests.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::ParamBag;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use switchyard_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state seen by middleware and handlers.
///
/// `RequestContext` carries:
/// - Unique request ID for log correlation
/// - The HTTP method, URI and headers
/// - The raw body bytes
/// - The merged, validated parameter bag (path captures, query, body)
///
/// # Example
///
/// ```
/// use switchyard_core::RequestContext;
/// use http::{HeaderMap, Method};
/// use bytes::Bytes;
///
/// let ctx = RequestContext::new(
///     Method::GET,
///     "/users/42?verbose=1".parse().unwrap(),
///     HeaderMap::new(),
///     Bytes::new(),
/// );
/// assert_eq!(ctx.path(), "/users/42");
/// assert_eq!(ctx.query(), Some("verbose=1"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: ParamBag,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID and no parameters.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            uri,
            headers,
            body,
            params: ParamBag::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns a copy of this context with the given request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the percent-decoded request path, or `None` if the decoded
    /// bytes are not UTF-8. Routes are matched against this form.
    #[must_use]
    pub fn decoded_path(&self) -> Option<Cow<'_, str>> {
        urlencoding::decode(self.uri.path()).ok()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the merged request parameters.
    #[must_use]
    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// Returns a single merged parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Replaces the merged parameter bag.
    ///
    /// Called by the dispatcher once captures, query and body are merged.
    pub fn set_params(&mut self, params: ParamBag) {
        self.params = params;
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
