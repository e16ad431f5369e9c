//! Parameter validation against a route's type contract.
//!
//! Validation is whitelist based. A parameter is accepted only when the route
//! declares its name or declares a `*` type, and its value passes the declared
//! type's check. The result is a report for the dispatcher to act on, not an
//! error.

use serde::Serialize;
use switchyard_core::ParamBag;

use crate::definition::{FieldTypes, WILDCARD};

/// The first parameter that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Offending parameter name.
    pub field: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Outcome of validating one parameter bag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    error: Option<ValidationFailure>,
}

impl ValidationReport {
    /// A passing report.
    #[must_use]
    pub const fn valid() -> Self {
        Self { error: None }
    }

    /// A failing report.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: Some(ValidationFailure {
                field: field.into(),
                reason: reason.into(),
            }),
        }
    }

    /// Returns true if every parameter passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationFailure> {
        self.error.as_ref()
    }

    /// Consumes the report, returning the failure if any.
    #[must_use]
    pub fn into_error(self) -> Option<ValidationFailure> {
        self.error
    }
}

/// Validates `params` against `field_types`.
///
/// Parameters are checked in insertion order and the first failure wins.
///
/// # Example
///
/// ```
/// use switchyard_core::ParamBag;
/// use switchyard_router::{parse, validate};
///
/// let contract = parse("/users/{id}[int]").unwrap().field_types;
///
/// let ok: ParamBag = [("id", "42")].into_iter().collect();
/// assert!(validate(&ok, &contract).is_valid());
///
/// let bad: ParamBag = [("id", "abc")].into_iter().collect();
/// assert_eq!(validate(&bad, &contract).error().unwrap().field, "id");
/// ```
#[must_use]
pub fn validate(params: &ParamBag, field_types: &FieldTypes) -> ValidationReport {
    let wildcard = field_types.get(WILDCARD);

    for (name, value) in params {
        let Some(tag) = field_types.get(name).or(wildcard) else {
            return ValidationReport::invalid(name, "unexpected field");
        };
        if let Err(reason) = tag.check(value) {
            return ValidationReport::invalid(name, reason);
        }
    }

    ValidationReport::valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeTag;

    fn bag(pairs: &[(&str, &str)]) -> ParamBag {
        pairs.iter().copied().collect()
    }

    fn types(pairs: &[(&str, TypeTag)]) -> FieldTypes {
        pairs
            .iter()
            .map(|(name, tag)| ((*name).to_string(), tag.clone()))
            .collect()
    }

    #[test]
    fn test_empty_params_always_valid() {
        assert!(validate(&ParamBag::new(), &FieldTypes::new()).is_valid());
        assert!(validate(&ParamBag::new(), &types(&[("x", TypeTag::Int)])).is_valid());
        assert!(validate(&ParamBag::new(), &types(&[("*", TypeTag::Bool)])).is_valid());
    }

    #[test]
    fn test_wildcard_int_accepts_numbers() {
        let report = validate(&bag(&[("x", "5")]), &types(&[("*", TypeTag::Int)]));
        assert!(report.is_valid());
    }

    #[test]
    fn test_wildcard_int_rejects_text() {
        let report = validate(&bag(&[("x", "a")]), &types(&[("*", TypeTag::Int)]));
        assert_eq!(report.error().unwrap().field, "x");
    }

    #[test]
    fn test_unexpected_field_without_wildcard() {
        let report = validate(&bag(&[("y", "1")]), &types(&[("x", TypeTag::Int)]));
        let failure = report.into_error().unwrap();
        assert_eq!(failure.field, "y");
        assert_eq!(failure.reason, "unexpected field");
    }

    #[test]
    fn test_explicit_type_beats_wildcard() {
        let contract = types(&[("name", TypeTag::String), ("*", TypeTag::Int)]);
        assert!(validate(&bag(&[("name", "ada"), ("age", "36")]), &contract).is_valid());
        assert!(!validate(&bag(&[("name", "ada"), ("age", "old")]), &contract).is_valid());
    }

    #[test]
    fn test_first_failure_short_circuits() {
        let contract = types(&[("a", TypeTag::Int), ("b", TypeTag::Int)]);
        let report = validate(&bag(&[("a", "x"), ("b", "y")]), &contract);
        assert_eq!(report.error().unwrap().field, "a");
    }

    #[test]
    fn test_unknown_type_fails_every_value() {
        let contract = types(&[("id", TypeTag::Unknown("uuid".into()))]);
        let report = validate(&bag(&[("id", "42")]), &contract);
        assert_eq!(report.error().unwrap().reason, "unknown type 'uuid'");
    }

    #[test]
    fn test_bool_tokens() {
        let contract = types(&[("flag", TypeTag::Bool)]);
        for ok in ["1", "0", "true", "FALSE", "True"] {
            assert!(validate(&bag(&[("flag", ok)]), &contract).is_valid(), "{ok}");
        }
        assert!(!validate(&bag(&[("flag", "on")]), &contract).is_valid());
    }
}
