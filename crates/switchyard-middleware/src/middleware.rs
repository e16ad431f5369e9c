//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that route middleware
//! implements. A middleware runs before the handler and decides, through a
//! [`Verdict`], whether the request proceeds.
//!
//! Middleware are referenced from routes by name (`Type@action`). A fresh
//! instance is created for every request, so `&mut self` state never leaks
//! between requests.
//!
//! # Example
//!
//! ```
//! use switchyard_core::{HandlerResult, RequestContext};
//! use switchyard_middleware::{Accumulator, BoxFuture, Middleware, Verdict};
//!
//! struct Auth;
//!
//! impl Middleware for Auth {
//!     fn handle<'a>(
//!         &'a mut self,
//!         _action: &'a str,
//!         ctx: &'a RequestContext,
//!         _acc: &'a Accumulator,
//!     ) -> BoxFuture<'a, HandlerResult<Verdict>> {
//!         Box::pin(async move {
//!             match ctx.header("authorization") {
//!                 Some(token) => Ok(Verdict::proceed_with([("token", token)])),
//!                 None => Ok(Verdict::reject("missing credentials")),
//!             }
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use switchyard_core::{HandlerResult, RequestContext};

use crate::Accumulator;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default action name.
pub const DEFAULT_ACTION: &str = "handle";

/// The decision a middleware returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Continue with the next middleware, merging this data.
    Proceed(Accumulator),
    /// Halt the chain. The request is answered with an authorization failure.
    Reject(Option<String>),
}

impl Verdict {
    /// Proceeds without contributing data.
    #[must_use]
    pub fn proceed() -> Self {
        Self::Proceed(Accumulator::new())
    }

    /// Proceeds, contributing `data` to the accumulator.
    #[must_use]
    pub fn proceed_with<I, K, V>(data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self::Proceed(data.into_iter().collect())
    }

    /// Rejects with a reason that is logged, never shown to clients.
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject(Some(reason.into()))
    }

    /// Rejects without a reason.
    #[must_use]
    pub const fn deny() -> Self {
        Self::Reject(None)
    }

    /// Returns true for [`Verdict::Proceed`].
    #[must_use]
    pub const fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed(_))
    }
}

impl From<bool> for Verdict {
    fn from(allowed: bool) -> Self {
        if allowed {
            Self::proceed()
        } else {
            Self::deny()
        }
    }
}

/// A route middleware.
///
/// # Contract
///
/// - Return `Ok(Verdict::Proceed(data))` to continue; `data` is merged into
///   the accumulator seen by later middleware and the handler
/// - Return `Ok(Verdict::Reject(..))` to halt; nothing accumulated so far
///   reaches the handler
/// - Return `Err(..)` for failures; the dispatcher answers `500`
pub trait Middleware: Send + 'static {
    /// Returns true if this middleware implements `action`.
    ///
    /// Checked once when routes are bound, so an unknown action fails at
    /// start-up rather than on the first request.
    fn supports(&self, action: &str) -> bool {
        action == DEFAULT_ACTION
    }

    /// Runs `action` for one request.
    fn handle<'a>(
        &'a mut self,
        action: &'a str,
        ctx: &'a RequestContext,
        acc: &'a Accumulator,
    ) -> BoxFuture<'a, HandlerResult<Verdict>>;
}

/// A middleware built from a synchronous closure.
///
/// The closure receives the action name, so one `FnMiddleware` can serve
/// several actions when constructed with [`FnMiddleware::with_actions`].
///
/// # Example
///
/// ```
/// use switchyard_middleware::{FnMiddleware, Verdict};
///
/// let throttle = FnMiddleware::new(|_action, ctx, _acc| {
///     Ok(Verdict::from(ctx.header("x-over-quota").is_none()))
/// });
/// ```
pub struct FnMiddleware<F> {
    func: Arc<F>,
    actions: Arc<[String]>,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&str, &RequestContext, &Accumulator) -> HandlerResult<Verdict> + Send + Sync + 'static,
{
    /// Creates a middleware answering the default action.
    pub fn new(func: F) -> Self {
        Self::with_actions([DEFAULT_ACTION], func)
    }

    /// Creates a middleware answering the given actions.
    pub fn with_actions<I, S>(actions: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            func: Arc::new(func),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

impl<F> Clone for FnMiddleware<F> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&str, &RequestContext, &Accumulator) -> HandlerResult<Verdict> + Send + Sync + 'static,
{
    fn supports(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    fn handle<'a>(
        &'a mut self,
        action: &'a str,
        ctx: &'a RequestContext,
        acc: &'a Accumulator,
    ) -> BoxFuture<'a, HandlerResult<Verdict>> {
        let result = (self.func)(action, ctx, acc);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::fixtures;

    #[test]
    fn test_verdict_from_bool() {
        assert!(Verdict::from(true).is_proceed());
        assert_eq!(Verdict::from(false), Verdict::Reject(None));
    }

    #[test]
    fn test_fn_middleware_actions() {
        let m = FnMiddleware::with_actions(["check", "admin"], |_, _, _| Ok(Verdict::proceed()));
        assert!(m.supports("check"));
        assert!(m.supports("admin"));
        assert!(!m.supports("handle"));
    }

    #[tokio::test]
    async fn test_fn_middleware_sees_action() {
        let mut m = FnMiddleware::with_actions(["a", "b"], |action, _, _| {
            Ok(Verdict::proceed_with([("action", action)]))
        });
        let ctx = fixtures::get("/");
        let acc = Accumulator::new();

        let verdict = m.handle("b", &ctx, &acc).await.unwrap();
        let Verdict::Proceed(data) = verdict else {
            panic!("expected proceed");
        };
        assert_eq!(data.get_str("action"), Some("b"));
    }
}
