//! Compiled matchers for dynamic routes.
//!
//! A dynamic clean path such as `/users/{id}/posts/{slug}` compiles to the
//! anchored pattern `^/users/(?P<id>[^/]+)/posts/(?P<slug>[^/]+)$`. Literal
//! text is escaped, so `.` or `+` in a path only ever match themselves.
//!
//! The capture class accepts any non-separator text. Types are enforced by
//! the validator, never by the matcher.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use switchyard_core::ParamBag;

use crate::{ParsedRoute, RouteError};

/// Capture group used for every placeholder.
const SEGMENT_CAPTURE: &str = "[^/]+";

/// An anchored matcher with one named capture per placeholder.
///
/// Serialized as its pattern source and recompiled when deserialized.
///
/// # Example
///
/// ```
/// use switchyard_router::{parse, CompiledMatcher};
///
/// let parsed = parse("/users/{id}[int]").unwrap();
/// let matcher = CompiledMatcher::compile(&parsed).unwrap();
///
/// let params = matcher.captures("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(matcher.captures("/users/42/extra").is_none());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompiledMatcher {
    regex: Regex,
}

impl CompiledMatcher {
    /// Compiles the clean path of a parsed route.
    pub fn compile(parsed: &ParsedRoute) -> Result<Self, RouteError> {
        Self::from_source(&pattern_source(&parsed.clean_path))
    }

    /// Recompiles a matcher from its pattern source.
    pub fn from_source(source: &str) -> Result<Self, RouteError> {
        Regex::new(source)
            .map(|regex| Self { regex })
            .map_err(|source_err| RouteError::Compilation {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if `path` matches.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches `path` and returns the raw captures by placeholder name.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<ParamBag> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamBag::with_capacity(self.regex.captures_len() - 1);
        for name in self.regex.capture_names().flatten() {
            if let Some(value) = caps.name(name) {
                params.insert(name, value.as_str());
            }
        }
        Some(params)
    }

    /// Returns the placeholder names in pattern order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }
}

/// Builds the anchored pattern source for a clean path.
fn pattern_source(clean_path: &str) -> String {
    let mut pattern = String::with_capacity(clean_path.len() + 16);
    pattern.push('^');

    let mut rest = clean_path;
    while let Some(open) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open + 1..];
        let close = after.find('}').unwrap_or(after.len());
        pattern.push_str("(?P<");
        pattern.push_str(&after[..close]);
        pattern.push('>');
        pattern.push_str(SEGMENT_CAPTURE);
        pattern.push(')');
        rest = after.get(close + 1..).unwrap_or("");
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    pattern
}

impl TryFrom<String> for CompiledMatcher {
    type Error = RouteError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::from_source(&source)
    }
}

impl From<CompiledMatcher> for String {
    fn from(matcher: CompiledMatcher) -> Self {
        matcher.regex.as_str().to_string()
    }
}

impl PartialEq for CompiledMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for CompiledMatcher {}

impl fmt::Debug for CompiledMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledMatcher").field(&self.as_str()).finish()
    }
}
