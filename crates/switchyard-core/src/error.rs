//! Error types for Switchyard.
//!
//! Two kinds of failure exist at request time:
//!
//! - [`HandlerError`] is raised by middleware or handler code. It is the
//!   equivalent of an uncaught exception and always becomes a `500`.
//! - [`DispatchFailure`] is the dispatcher's own classification of a request
//!   that did not reach (or did not survive) the handler. Every variant maps to
//!   exactly one HTTP status through its [`FailureCategory`].
//!
//! Clients only ever see an [`ErrorEnvelope`]. Outside debug mode the envelope
//! carries a generic message per category; in debug mode it adds
//! [`Diagnostics`] (message, location and cause chain).

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::panic::Location;
use thiserror::Error;

/// Result type alias for middleware and handler code.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// HTTP status used for CSRF failures ("page expired").
const PAGE_EXPIRED: u16 = 419;

/// A failure raised by middleware or handler code.
///
/// The construction site is captured with `#[track_caller]` so debug-mode
/// responses can point at the code that failed.
///
/// # Example
///
/// ```
/// use switchyard_core::{HandlerError, HandlerResult};
///
/// fn load_user(id: &str) -> HandlerResult<String> {
///     if id.is_empty() {
///         return Err(HandlerError::new("user id must not be empty"));
///     }
///     Ok(format!("user-{id}"))
/// }
///
/// let err = load_user("").unwrap_err();
/// assert_eq!(err.message(), "user id must not be empty");
/// ```
#[derive(Error, Debug)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    location: &'static Location<'static>,
    #[source]
    source: Option<anyhow::Error>,
}

impl HandlerError {
    /// Creates a handler error with a message.
    #[must_use]
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
            source: None,
        }
    }

    /// Creates a handler error wrapping an underlying cause.
    #[track_caller]
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
            source: Some(source.into()),
        }
    }

    /// Creates a handler error from a caught panic payload.
    #[must_use]
    #[track_caller]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::new(format!("panicked: {detail}"))
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `file:line:column` of the construction site.
    #[must_use]
    pub fn location(&self) -> String {
        format!(
            "{}:{}:{}",
            self.location.file(),
            self.location.line(),
            self.location.column()
        )
    }

    /// Returns the chain of underlying causes, outermost first.
    #[must_use]
    pub fn trace(&self) -> Vec<String> {
        self.source
            .as_ref()
            .map(|source| source.chain().map(ToString::to_string).collect())
            .unwrap_or_default()
    }
}

impl From<anyhow::Error> for HandlerError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        Self::with_source(err.to_string(), err)
    }
}

impl From<serde_json::Error> for HandlerError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON serialization failed", err)
    }
}

/// Categories of request-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// No route matched the method and path.
    NotFound,
    /// Request parameters violated the route's type contract.
    Validation,
    /// CSRF token missing or rejected.
    Csrf,
    /// A middleware rejected the request.
    Authorization,
    /// Middleware or handler code failed.
    Internal,
}

impl FailureCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation | Self::Authorization => StatusCode::FORBIDDEN,
            Self::Csrf => {
                StatusCode::from_u16(PAGE_EXPIRED).unwrap_or(StatusCode::FORBIDDEN)
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the generic client-facing message for this category.
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::NotFound => "Not Found",
            Self::Validation | Self::Authorization => "Forbidden",
            Self::Csrf => "Page Expired",
            Self::Internal => "Internal Server Error",
        }
    }

    /// Returns the record-sink category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Csrf => "csrf",
            Self::Authorization => "middleware",
            Self::Internal => "handler",
        }
    }
}

/// A request that did not produce a handler response.
///
/// All variants are recovered by the dispatcher and turned into an HTTP
/// response; none of them escapes dispatch.
#[derive(Error, Debug)]
pub enum DispatchFailure {
    /// No route matched.
    #[error("no route for {method} {path}")]
    NotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// A parameter failed the route's whitelist or type check.
    #[error("parameter '{field}' rejected: {reason}")]
    Validation {
        /// The offending parameter name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// CSRF verification failed.
    #[error("CSRF verification failed: {reason}")]
    Csrf {
        /// Why verification failed.
        reason: String,
    },

    /// A middleware signalled rejection.
    #[error("rejected by middleware {middleware}")]
    MiddlewareRejection {
        /// The middleware reference that rejected (`Type@action`).
        middleware: String,
        /// Optional reason supplied by the middleware.
        reason: Option<String>,
    },

    /// Middleware or handler code failed.
    #[error("handler failure: {0}")]
    Handler(#[from] HandlerError),
}

impl DispatchFailure {
    /// Returns the failure category.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::NotFound { .. } => FailureCategory::NotFound,
            Self::Validation { .. } => FailureCategory::Validation,
            Self::Csrf { .. } => FailureCategory::Csrf,
            Self::MiddlewareRejection { .. } => FailureCategory::Authorization,
            Self::Handler(_) => FailureCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this failure.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns a structured payload describing the failure, for logging.
    #[must_use]
    pub fn log_fields(&self) -> serde_json::Value {
        match self {
            Self::NotFound { method, path } => serde_json::json!({
                "method": method,
                "path": path,
            }),
            Self::Validation { field, reason } => serde_json::json!({
                "field": field,
                "reason": reason,
            }),
            Self::Csrf { reason } => serde_json::json!({ "reason": reason }),
            Self::MiddlewareRejection { middleware, reason } => serde_json::json!({
                "middleware": middleware,
                "reason": reason,
            }),
            Self::Handler(err) => serde_json::json!({
                "message": err.message(),
                "location": err.location(),
                "trace": err.trace(),
            }),
        }
    }

    /// Returns debug diagnostics for this failure.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            Self::Handler(err) => Diagnostics {
                message: err.message().to_string(),
                location: Some(err.location()),
                trace: err.trace(),
            },
            other => Diagnostics {
                message: other.to_string(),
                location: None,
                trace: Vec::new(),
            },
        }
    }

    /// Converts this failure to a client-facing error envelope.
    ///
    /// Outside debug mode the message is the generic text of the category and
    /// no details are attached.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>, debug: bool) -> ErrorEnvelope {
        let category = self.category();
        let (message, details) = if debug {
            (self.to_string(), Some(self.diagnostics()))
        } else {
            (category.public_message().to_string(), None)
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                category,
                details,
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::Csrf { .. } => "CSRF_TOKEN_MISMATCH",
            Self::MiddlewareRejection { .. } => "FORBIDDEN",
            Self::Handler(_) => "INTERNAL_ERROR",
        }
    }
}

/// Debug-mode details attached to an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Full failure message.
    pub message: String,
    /// Construction site of the failure, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Cause chain, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Client-facing message.
    pub message: String,
    /// Failure category.
    pub category: FailureCategory,
    /// Debug diagnostics, only present in debug mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Diagnostics>,
}
