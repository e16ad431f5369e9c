//! HTTP methods a route can be registered for.

use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A routable HTTP method.
///
/// The route table is partitioned by this type. It is a closed set so the
/// table serializes with stable keys and an unknown request method simply
/// finds no route.
///
/// # Example
///
/// ```rust
/// use switchyard_router::RouteMethod;
/// use http::Method;
///
/// assert_eq!(RouteMethod::from_http(&Method::PATCH), Some(RouteMethod::Patch));
/// assert_eq!("post".parse::<RouteMethod>().unwrap(), RouteMethod::Post);
/// assert!(RouteMethod::Delete.is_state_changing());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl RouteMethod {
    /// Methods registered by the `any` DSL verb.
    pub const ANY: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Converts an `http::Method`. Returns `None` for unroutable methods.
    #[must_use]
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::PATCH => Some(Self::Patch),
            Method::DELETE => Some(Self::Delete),
            Method::HEAD => Some(Self::Head),
            Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }

    /// Returns the equivalent `http::Method`.
    #[must_use]
    pub fn as_http(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
            Self::Head => Method::HEAD,
            Self::Options => Method::OPTIONS,
        }
    }

    /// Returns the uppercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Returns true for methods that require CSRF verification.
    #[must_use]
    pub const fn is_state_changing(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown HTTP method '{}'", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for RouteMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_round_trip() {
        for method in [
            RouteMethod::Get,
            RouteMethod::Post,
            RouteMethod::Put,
            RouteMethod::Patch,
            RouteMethod::Delete,
            RouteMethod::Head,
            RouteMethod::Options,
        ] {
            assert_eq!(RouteMethod::from_http(&method.as_http()), Some(method));
        }
    }

    #[test]
    fn test_unroutable_methods() {
        assert_eq!(RouteMethod::from_http(&Method::TRACE), None);
        assert_eq!(RouteMethod::from_http(&Method::CONNECT), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Delete".parse::<RouteMethod>(), Ok(RouteMethod::Delete));
        assert!("fetch".parse::<RouteMethod>().is_err());
    }

    #[test]
    fn test_state_changing() {
        assert!(!RouteMethod::Get.is_state_changing());
        assert!(!RouteMethod::Head.is_state_changing());
        assert!(RouteMethod::Post.is_state_changing());
        assert!(RouteMethod::Put.is_state_changing());
        assert!(RouteMethod::Patch.is_state_changing());
    }

    #[test]
    fn test_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RouteMethod::Patch).unwrap(), r#""PATCH""#);
    }
}
