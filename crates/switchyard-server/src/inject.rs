//! Handler argument injection.
//!
//! Handlers declare what they need through their parameter types. Only four
//! kinds of argument can be injected:
//!
//! | Type                 | Kind          | Value                                   |
//! |----------------------|---------------|-----------------------------------------|
//! | `RequestContext`     | `Request`     | the request, with validated parameters  |
//! | `ResponseDraft`      | `Response`    | the shared response under construction  |
//! | `Accumulator`        | `Accumulator` | data merged by the middleware chain     |
//! | `ParamBag`           | `ParamBag`    | parameters plus middleware data as text |
//!
//! There is no container: a handler with any other parameter type does not
//! implement [`Handler`](crate::Handler) and is rejected at compile time.

use std::fmt;

use switchyard_core::{ParamBag, RequestContext};
use switchyard_middleware::Accumulator;

use crate::ResponseDraft;

/// The kinds of value a handler argument can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectKind {
    /// The request context.
    Request,
    /// The response draft.
    Response,
    /// The middleware accumulator.
    Accumulator,
    /// The legacy parameter bag.
    ParamBag,
}

impl InjectKind {
    /// Returns the kind as a lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Accumulator => "accumulator",
            Self::ParamBag => "params",
        }
    }
}

impl fmt::Display for InjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a handler can be given for one request.
#[derive(Debug, Clone)]
pub struct Invocation {
    request: RequestContext,
    response: ResponseDraft,
    accumulator: Accumulator,
}

impl Invocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(request: RequestContext, response: ResponseDraft, accumulator: Accumulator) -> Self {
        Self {
            request,
            response,
            accumulator,
        }
    }

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Returns the response draft.
    #[must_use]
    pub fn response(&self) -> &ResponseDraft {
        &self.response
    }

    /// Returns the middleware accumulator.
    #[must_use]
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Builds the legacy parameter bag.
    ///
    /// Request parameters come first; middleware data fills in names the
    /// request did not supply. Non-string JSON values are rendered as JSON.
    #[must_use]
    pub fn legacy_params(&self) -> ParamBag {
        let mut bag = self.request.params().clone();
        for (key, value) in self.accumulator.iter() {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            bag.insert_if_absent(key, text);
        }
        bag
    }
}

/// A type that can be injected as a handler argument.
pub trait Inject: Send + Sized + 'static {
    /// The kind recorded in the handler signature.
    const KIND: InjectKind;

    /// Produces the argument value.
    fn inject(invocation: &Invocation) -> Self;
}

impl Inject for RequestContext {
    const KIND: InjectKind = InjectKind::Request;

    fn inject(invocation: &Invocation) -> Self {
        invocation.request.clone()
    }
}

impl Inject for ResponseDraft {
    const KIND: InjectKind = InjectKind::Response;

    fn inject(invocation: &Invocation) -> Self {
        invocation.response.clone()
    }
}

impl Inject for Accumulator {
    const KIND: InjectKind = InjectKind::Accumulator;

    fn inject(invocation: &Invocation) -> Self {
        invocation.accumulator.clone()
    }
}

impl Inject for ParamBag {
    const KIND: InjectKind = InjectKind::ParamBag;

    fn inject(invocation: &Invocation) -> Self {
        invocation.legacy_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::fixtures;

    fn invocation() -> Invocation {
        let mut request = fixtures::get("/users/42");
        let mut params = ParamBag::new();
        params.insert("id", "42");
        request.set_params(params);

        let mut accumulator = Accumulator::new();
        accumulator.insert("user", "alice");
        accumulator.insert("id", "from-middleware");
        accumulator.insert("roles", serde_json::json!(["admin"]));

        Invocation::new(request, ResponseDraft::new(), accumulator)
    }

    #[test]
    fn test_legacy_params_prefer_request() {
        let bag = ParamBag::inject(&invocation());
        assert_eq!(bag.get("id"), Some("42"));
        assert_eq!(bag.get("user"), Some("alice"));
        assert_eq!(bag.get("roles"), Some(r#"["admin"]"#));
    }

    #[test]
    fn test_request_injection_carries_params() {
        let request = RequestContext::inject(&invocation());
        assert_eq!(request.param("id"), Some("42"));
        assert_eq!(request.path(), "/users/42");
    }

    #[test]
    fn test_response_injection_shares_draft() {
        let invocation = invocation();
        let draft = ResponseDraft::inject(&invocation);
        draft.write("hi");
        assert_eq!(invocation.response().body(), "hi");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(<RequestContext as Inject>::KIND, InjectKind::Request);
        assert_eq!(<ResponseDraft as Inject>::KIND, InjectKind::Response);
        assert_eq!(<Accumulator as Inject>::KIND, InjectKind::Accumulator);
        assert_eq!(<ParamBag as Inject>::KIND, InjectKind::ParamBag);
        assert_eq!(InjectKind::ParamBag.to_string(), "params");
    }
}
