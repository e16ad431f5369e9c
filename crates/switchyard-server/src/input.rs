//! Request input parsing and parameter merging.

use http::header;
use serde_json::{Map, Value};
use switchyard_core::{ParamBag, RequestContext};

/// A request body decoded for parameter and token lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum BodyInput {
    /// A JSON object body.
    Json(Map<String, Value>),
    /// A form-encoded body.
    Form(Vec<(String, String)>),
    /// No body, or one that carries no parameters.
    #[default]
    Empty,
}

impl BodyInput {
    /// Decodes the body according to its content type.
    ///
    /// Bodies that fail to decode, JSON bodies that are not objects, and other
    /// content types carry no parameters.
    pub(crate) fn parse(ctx: &RequestContext) -> Self {
        if ctx.body().is_empty() {
            return Self::Empty;
        }

        let content_type = ctx
            .header(header::CONTENT_TYPE.as_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") || content_type.contains("+json") {
            match serde_json::from_slice::<Value>(ctx.body()) {
                Ok(Value::Object(map)) => Self::Json(map),
                Ok(_) => Self::Empty,
                Err(e) => {
                    tracing::debug!(request_id = %ctx.request_id(), error = %e, "ignoring malformed JSON body");
                    Self::Empty
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match serde_urlencoded::from_bytes::<Vec<(String, String)>>(ctx.body()) {
                Ok(pairs) => Self::Form(pairs),
                Err(e) => {
                    tracing::debug!(request_id = %ctx.request_id(), error = %e, "ignoring malformed form body");
                    Self::Empty
                }
            }
        } else {
            Self::Empty
        }
    }

    /// Returns the JSON field `name` if it is a string.
    pub(crate) fn json_str(&self, name: &str) -> Option<&str> {
        match self {
            Self::Json(map) => map.get(name).and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns the first form field called `name`.
    pub(crate) fn form_str(&self, name: &str) -> Option<&str> {
        match self {
            Self::Form(pairs) => pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Returns the body parameters as text.
    fn pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::Json(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), render(value)))
                .collect(),
            Self::Form(pairs) => pairs.clone(),
            Self::Empty => Vec::new(),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decodes the query string into pairs. A malformed query carries no pairs.
fn query_pairs(ctx: &RequestContext) -> Vec<(String, String)> {
    ctx.query()
        .and_then(|query| serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok())
        .unwrap_or_default()
}

/// Merges path captures, query and body parameters into one bag.
///
/// The first source to supply a name wins: captures, then query, then body.
/// The field called `exclude` is dropped from query and body.
pub(crate) fn merge_params(
    captures: ParamBag,
    ctx: &RequestContext,
    body: &BodyInput,
    exclude: &str,
) -> ParamBag {
    let mut bag = captures;
    for (key, value) in query_pairs(ctx).into_iter().chain(body.pairs()) {
        if key != exclude {
            bag.insert_if_absent(key, value);
        }
    }
    bag
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use switchyard_core::fixtures;

    #[test]
    fn test_parse_json_object() {
        let ctx = fixtures::json_request(
            Method::POST,
            "/posts",
            &serde_json::json!({ "title": "Hi", "draft": true, "_token": "t" }),
        );
        let body = BodyInput::parse(&ctx);
        assert_eq!(body.json_str("_token"), Some("t"));
        assert_eq!(body.json_str("draft"), None);
        assert_eq!(body.form_str("_token"), None);
    }

    #[test]
    fn test_parse_form() {
        let ctx = fixtures::form_request(Method::POST, "/posts", "title=Hello+there&_token=abc");
        let body = BodyInput::parse(&ctx);
        assert_eq!(body.form_str("title"), Some("Hello there"));
        assert_eq!(body.form_str("_token"), Some("abc"));
    }

    #[test]
    fn test_malformed_json_is_empty() {
        let mut headers = http::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let ctx = RequestContext::new(
            Method::POST,
            "/posts".parse().unwrap(),
            headers,
            bytes::Bytes::from_static(b"{not json"),
        );
        assert_eq!(BodyInput::parse(&ctx), BodyInput::Empty);
    }

    #[test]
    fn test_json_array_is_empty() {
        let ctx = fixtures::json_request(Method::POST, "/posts", &serde_json::json!([1, 2]));
        assert_eq!(BodyInput::parse(&ctx), BodyInput::Empty);
    }

    #[test]
    fn test_merge_precedence_and_exclusion() {
        let ctx = fixtures::json_request(
            Method::PUT,
            "/users/42?id=7&sort=asc&_token=q",
            &serde_json::json!({ "id": 9, "sort": "desc", "age": 30, "note": null, "_token": "b" }),
        );
        let body = BodyInput::parse(&ctx);

        let mut captures = ParamBag::new();
        captures.insert("id", "42");

        let bag = merge_params(captures, &ctx, &body, "_token");
        assert_eq!(bag.get("id"), Some("42"));
        assert_eq!(bag.get("sort"), Some("asc"));
        assert_eq!(bag.get("age"), Some("30"));
        assert_eq!(bag.get("note"), Some(""));
        assert!(!bag.contains("_token"));
    }
}
