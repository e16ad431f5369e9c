//! Route definition parsing.
//!
//! A route definition is the string an application registers, for example:
//!
//! ```text
//! /users/{id}[int]/posts/{slug}?[int page][string *] @api
//! ```
//!
//! It breaks down into:
//!
//! - a path whose `{name}` placeholders may carry a `[type]` suffix
//! - an optional query-constraint block after the first `?`, made of
//!   `[type name]` or `[type *]` tokens
//! - an optional trailing `@api` marker, which exempts the route from CSRF
//!   verification
//!
//! Parsing never validates type names against a closed set. An unknown tag is
//! kept as [`TypeTag::Unknown`] and fails every value at request time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RouteError;

/// Marker that flags a route as API-only.
pub const API_MARKER: &str = "@api";

/// Key that applies a type to every otherwise unlisted parameter.
pub const WILDCARD: &str = "*";

/// Declared parameter names mapped to their types, in declaration order.
pub type FieldTypes = IndexMap<String, TypeTag>;

/// Declared type of a route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    /// Any string.
    String,
    /// A base-10 `i64` with canonical formatting.
    Int,
    /// A finite `f64`.
    Float,
    /// `1`, `0`, `true` or `false`, case-insensitive.
    Bool,
    /// Any value (`*`).
    Any,
    /// An unrecognized tag, kept verbatim.
    Unknown(String),
}

impl TypeTag {
    /// Returns the textual form of the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Any => WILDCARD,
            Self::Unknown(tag) => tag,
        }
    }

    /// Checks a raw value against this type.
    ///
    /// Returns a description of the mismatch on failure.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let ok = match self {
            Self::String | Self::Any => true,
            Self::Int => value
                .parse::<i64>()
                .is_ok_and(|n| n.to_string() == value),
            Self::Float => value.parse::<f64>().is_ok_and(f64::is_finite),
            Self::Bool => ["1", "0", "true", "false"]
                .iter()
                .any(|token| value.eq_ignore_ascii_case(token)),
            Self::Unknown(tag) => return Err(format!("unknown type '{tag}'")),
        };

        if ok {
            Ok(())
        } else {
            Err(format!("expected {}", self.as_str()))
        }
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        match tag {
            "string" => Self::String,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            WILDCARD => Self::Any,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of parsing one route definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoute {
    /// The path with `[type]` suffixes removed, e.g. `/users/{id}`.
    pub clean_path: String,
    /// True if the path contains at least one placeholder.
    pub is_dynamic: bool,
    /// Declared parameter types.
    pub field_types: FieldTypes,
    /// True if the definition carried the API marker.
    pub is_api: bool,
}

impl ParsedRoute {
    /// Returns the placeholder names of the clean path, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.clean_path
            .split('{')
            .skip(1)
            .filter_map(|chunk| chunk.split_once('}').map(|(name, _)| name))
    }
}

/// Parses a route definition string.
///
/// # Example
///
/// ```
/// use switchyard_router::{parse, TypeTag};
///
/// let parsed = parse("/users/{id}[int]?[string *] @api").unwrap();
/// assert_eq!(parsed.clean_path, "/users/{id}");
/// assert!(parsed.is_dynamic);
/// assert!(parsed.is_api);
/// assert_eq!(parsed.field_types["id"], TypeTag::Int);
/// assert_eq!(parsed.field_types["*"], TypeTag::String);
/// ```
pub fn parse(definition: &str) -> Result<ParsedRoute, RouteError> {
    let trimmed = definition.trim();
    if trimmed.is_empty() {
        return Err(RouteError::malformed(definition, "empty route definition"));
    }

    let (body, is_api) = match trimmed.strip_suffix(API_MARKER) {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    };

    let (path, constraints) = match body.split_once('?') {
        Some((path, block)) => (path, Some(block)),
        None => (body, None),
    };

    if !path.starts_with('/') {
        return Err(RouteError::malformed(definition, "path must start with '/'"));
    }

    let mut field_types = FieldTypes::new();
    if let Some(block) = constraints {
        parse_constraints(definition, block, &mut field_types)?;
    }

    let (clean_path, is_dynamic) = scan_path(definition, path, &mut field_types)?;

    Ok(ParsedRoute {
        clean_path,
        is_dynamic,
        field_types,
        is_api,
    })
}

/// Parses `[type name]` tokens from the query-constraint block.
fn parse_constraints(
    definition: &str,
    block: &str,
    field_types: &mut FieldTypes,
) -> Result<(), RouteError> {
    let mut rest = block.trim_start();
    while !rest.is_empty() {
        let Some(inner_start) = rest.strip_prefix('[') else {
            return Err(RouteError::malformed(
                definition,
                format!("expected '[type name]' in query constraints, found '{rest}'"),
            ));
        };
        let close = inner_start.find(']').ok_or_else(|| {
            RouteError::malformed(definition, "unclosed '[' in query constraints")
        })?;

        let mut parts = inner_start[..close].split_whitespace();
        let (Some(tag), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RouteError::malformed(
                definition,
                format!(
                    "query constraint '[{}]' must be '[type name]'",
                    &inner_start[..close]
                ),
            ));
        };
        if name.contains(['[', '{', '}']) {
            return Err(RouteError::malformed(
                definition,
                format!("invalid parameter name '{name}'"),
            ));
        }

        field_types.insert(name.to_string(), TypeTag::from(tag));
        rest = inner_start[close + 1..].trim_start();
    }
    Ok(())
}

/// Scans the path for placeholders, recording their types.
///
/// Returns the clean path and whether any placeholder was found.
fn scan_path(
    definition: &str,
    path: &str,
    field_types: &mut FieldTypes,
) -> Result<(String, bool), RouteError> {
    let mut clean = String::with_capacity(path.len());
    let mut is_dynamic = false;
    let mut rest = path;

    while let Some(idx) = rest.find(['{', '}', '[', ']']) {
        if rest.as_bytes()[idx] != b'{' {
            return Err(RouteError::malformed(
                definition,
                format!("unexpected '{}' in path", &rest[idx..=idx]),
            ));
        }
        clean.push_str(&rest[..idx]);

        let after = &rest[idx + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| RouteError::malformed(definition, "unclosed '{' in path"))?;
        let name = &after[..close];
        if name.is_empty() || name.contains(['{', '/', '[', ']']) {
            return Err(RouteError::malformed(
                definition,
                format!("invalid placeholder name '{name}'"),
            ));
        }

        let mut tail = &after[close + 1..];
        let tag = match tail.strip_prefix('[') {
            Some(suffix) => {
                let end = suffix.find(']').ok_or_else(|| {
                    RouteError::malformed(definition, "unclosed '[' in type suffix")
                })?;
                let tag = suffix[..end].trim();
                if tag.is_empty() {
                    return Err(RouteError::malformed(
                        definition,
                        format!("empty type suffix on '{name}'"),
                    ));
                }
                tail = &suffix[end + 1..];
                TypeTag::from(tag)
            }
            None => TypeTag::Any,
        };

        field_types.insert(name.to_string(), tag);
        clean.push('{');
        clean.push_str(name);
        clean.push('}');
        is_dynamic = true;
        rest = tail;
    }
    clean.push_str(rest);

    Ok((clean, is_dynamic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_static_route() {
        let parsed = parse("/about").unwrap();
        assert_eq!(parsed.clean_path, "/about");
        assert!(!parsed.is_dynamic);
        assert!(!parsed.is_api);
        assert!(parsed.field_types.is_empty());
    }

    #[test]
    fn test_placeholder_defaults_to_wildcard() {
        let parsed = parse("/posts/{slug}").unwrap();
        assert!(parsed.is_dynamic);
        assert_eq!(parsed.field_types["slug"], TypeTag::Any);
    }

    #[test]
    fn test_typed_placeholders_are_cleaned() {
        let parsed = parse("/orgs/{org}[string]/users/{id}[int]").unwrap();
        assert_eq!(parsed.clean_path, "/orgs/{org}/users/{id}");
        assert_eq!(parsed.field_types["org"], TypeTag::String);
        assert_eq!(parsed.field_types["id"], TypeTag::Int);
        assert_eq!(parsed.placeholders().collect::<Vec<_>>(), vec!["org", "id"]);
    }

    #[test]
    fn test_query_constraints_on_static_route() {
        let parsed = parse("/search?[string q] [int page]").unwrap();
        assert!(!parsed.is_dynamic);
        assert_eq!(parsed.clean_path, "/search");
        assert_eq!(parsed.field_types["q"], TypeTag::String);
        assert_eq!(parsed.field_types["page"], TypeTag::Int);
    }

    #[test]
    fn test_path_type_overrides_query_constraint() {
        let parsed = parse("/items/{id}[int]?[string id]").unwrap();
        assert_eq!(parsed.field_types["id"], TypeTag::Int);
    }

    #[test]
    fn test_wildcard_constraint() {
        let parsed = parse("/filter?[int *]").unwrap();
        assert_eq!(parsed.field_types[WILDCARD], TypeTag::Int);
    }

    #[test]
    fn test_api_marker() {
        let parsed = parse("/api/users/{id} @api").unwrap();
        assert!(parsed.is_api);
        assert_eq!(parsed.clean_path, "/api/users/{id}");

        let tight = parse("/api/ping@api").unwrap();
        assert!(tight.is_api);
        assert_eq!(tight.clean_path, "/api/ping");
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let parsed = parse("/x/{id}[uuid]").unwrap();
        assert_eq!(parsed.field_types["id"], TypeTag::Unknown("uuid".into()));
    }

    #[test]
    fn test_empty_definition_is_malformed() {
        assert!(matches!(parse(""), Err(RouteError::Malformed { .. })));
        assert!(matches!(parse("   "), Err(RouteError::Malformed { .. })));
        assert!(matches!(parse("@api"), Err(RouteError::Malformed { .. })));
    }

    #[test]
    fn test_unbalanced_tokens_are_malformed() {
        for bad in [
            "/users/{id",
            "/users/id}",
            "/users/{}",
            "/users/{id}[int",
            "/users/{id}[]",
            "/users?[int]",
            "/users?page",
            "users",
        ] {
            assert!(
                matches!(parse(bad), Err(RouteError::Malformed { .. })),
                "expected {bad} to be malformed"
            );
        }
    }

    #[test]
    fn test_type_checks() {
        assert!(TypeTag::Int.check("42").is_ok());
        assert!(TypeTag::Int.check("-7").is_ok());
        assert!(TypeTag::Int.check("+7").is_err());
        assert!(TypeTag::Int.check("007").is_err());
        assert!(TypeTag::Int.check(" 7").is_err());
        assert!(TypeTag::Int.check("abc").is_err());

        assert!(TypeTag::Float.check("1.5").is_ok());
        assert!(TypeTag::Float.check("3").is_ok());
        assert!(TypeTag::Float.check("NaN").is_err());
        assert!(TypeTag::Float.check("inf").is_err());

        assert!(TypeTag::Bool.check("TRUE").is_ok());
        assert!(TypeTag::Bool.check("0").is_ok());
        assert!(TypeTag::Bool.check("yes").is_err());

        assert!(TypeTag::String.check("anything").is_ok());
        assert!(TypeTag::Any.check("").is_ok());
        assert!(TypeTag::Unknown("uuid".into()).check("x").is_err());
    }

    #[test]
    fn test_type_tag_round_trips_through_string() {
        for tag in ["string", "int", "float", "bool", "*", "uuid"] {
            assert_eq!(String::from(TypeTag::from(tag)), tag);
        }
    }

    proptest! {
        #[test]
        fn literal_paths_are_never_dynamic(segments in proptest::collection::vec("[a-z0-9_.-]{1,8}", 0..6)) {
            let path = format!("/{}", segments.join("/"));
            let parsed = parse(&path).unwrap();
            prop_assert!(!parsed.is_dynamic);
            prop_assert_eq!(parsed.clean_path, path);
        }

        #[test]
        fn every_placeholder_has_a_type(names in proptest::collection::vec("[a-z][a-z0-9_]{0,6}", 1..5)) {
            let path: String = names.iter().map(|n| format!("/{{{n}}}[int]")).collect();
            let parsed = parse(&path).unwrap();
            for name in parsed.placeholders() {
                prop_assert!(parsed.field_types.contains_key(name));
            }
        }
    }
}
