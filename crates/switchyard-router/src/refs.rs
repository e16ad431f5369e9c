//! Textual references to handlers and middleware.
//!
//! Routes never hold code. They name a handler as `Controller@action` and a
//! middleware as `Type@action`; the server resolves the names against its
//! registries once, at start-up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RouteError;

/// Action invoked on a middleware reference without an explicit `@action`.
pub const DEFAULT_MIDDLEWARE_ACTION: &str = "handle";

/// Reference to a handler: `Controller@action`.
///
/// # Example
///
/// ```
/// use switchyard_router::HandlerRef;
///
/// let handler: HandlerRef = "UserController@show".parse().unwrap();
/// assert_eq!(handler.controller(), "UserController");
/// assert_eq!(handler.action(), "show");
/// assert_eq!(handler.to_string(), "UserController@show");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandlerRef {
    controller: String,
    action: String,
}

impl HandlerRef {
    /// Creates a handler reference.
    #[must_use]
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Returns the controller name.
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl FromStr for HandlerRef {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((controller, action))
                if is_identifier(controller) && is_identifier(action) =>
            {
                Ok(Self::new(controller, action))
            }
            _ => Err(RouteError::malformed(
                s,
                "handler reference must be 'Controller@action'",
            )),
        }
    }
}

impl TryFrom<String> for HandlerRef {
    type Error = RouteError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HandlerRef> for String {
    fn from(handler: HandlerRef) -> Self {
        handler.to_string()
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// Reference to a middleware: `Type@action`, or `Type` for the default action.
///
/// # Example
///
/// ```
/// use switchyard_router::MiddlewareRef;
///
/// let auth: MiddlewareRef = "Auth".parse().unwrap();
/// assert_eq!(auth.action(), "handle");
///
/// let admin: MiddlewareRef = "Auth@admin".parse().unwrap();
/// assert_eq!(admin.middleware_type(), "Auth");
/// assert_eq!(admin.action(), "admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MiddlewareRef {
    middleware_type: String,
    action: String,
}

impl MiddlewareRef {
    /// Creates a middleware reference.
    #[must_use]
    pub fn new(middleware_type: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            middleware_type: middleware_type.into(),
            action: action.into(),
        }
    }

    /// Returns the middleware type name.
    #[must_use]
    pub fn middleware_type(&self) -> &str {
        &self.middleware_type
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl FromStr for MiddlewareRef {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (middleware_type, action) = s
            .split_once('@')
            .unwrap_or((s, DEFAULT_MIDDLEWARE_ACTION));
        if is_identifier(middleware_type) && is_identifier(action) {
            Ok(Self::new(middleware_type, action))
        } else {
            Err(RouteError::malformed(
                s,
                "middleware reference must be 'Type' or 'Type@action'",
            ))
        }
    }
}

impl TryFrom<String> for MiddlewareRef {
    type Error = RouteError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MiddlewareRef> for String {
    fn from(middleware: MiddlewareRef) -> Self {
        middleware.to_string()
    }
}

impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.middleware_type, self.action)
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_ref_requires_action() {
        assert!("UserController".parse::<HandlerRef>().is_err());
        assert!("@show".parse::<HandlerRef>().is_err());
        assert!("UserController@".parse::<HandlerRef>().is_err());
        assert!("User Controller@show".parse::<HandlerRef>().is_err());
    }

    #[test]
    fn test_namespaced_handler() {
        let handler: HandlerRef = "admin::UserController@index".parse().unwrap();
        assert_eq!(handler.controller(), "admin::UserController");
    }

    #[test]
    fn test_middleware_default_action() {
        let middleware: MiddlewareRef = "Throttle".parse().unwrap();
        assert_eq!(middleware.to_string(), "Throttle@handle");
    }

    #[test]
    fn test_serde_as_strings() {
        let middleware = MiddlewareRef::new("Auth", "check");
        let json = serde_json::to_string(&middleware).unwrap();
        assert_eq!(json, r#""Auth@check""#);
        let back: MiddlewareRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, middleware);

        assert!(serde_json::from_str::<HandlerRef>(r#""nope""#).is_err());
    }
}
