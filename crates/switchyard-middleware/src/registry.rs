//! Named middleware factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use switchyard_core::{HandlerResult, RequestContext};
use thiserror::Error;

use crate::{Accumulator, FnMiddleware, Middleware, Verdict};

/// Creates a fresh middleware instance.
pub type MiddlewareFactory = Arc<dyn Fn() -> Box<dyn Middleware> + Send + Sync>;

/// A middleware reference could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No middleware is registered under this type name.
    #[error("unknown middleware type '{0}'")]
    UnknownType(String),

    /// The middleware does not implement the action.
    #[error("middleware '{middleware}' has no action '{action}'")]
    UnknownAction {
        /// Middleware type name.
        middleware: String,
        /// Requested action.
        action: String,
    },
}

/// Registry of middleware factories keyed by type name.
///
/// # Example
///
/// ```
/// use switchyard_middleware::{MiddlewareRegistry, Verdict};
///
/// let mut registry = MiddlewareRegistry::new();
/// registry.register_fn("Auth", |_action, ctx, _acc| {
///     Ok(Verdict::from(ctx.header("authorization").is_some()))
/// });
///
/// assert!(registry.contains("Auth"));
/// assert!(registry.check("Auth", "handle").is_ok());
/// assert!(registry.check("Auth", "admin").is_err());
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<M, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        M: Middleware,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let factory: MiddlewareFactory = Arc::new(move || Box::new(factory()));
        self.factories.insert(name.into(), factory);
        self
    }

    /// Registers a closure middleware answering the default action.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&str, &RequestContext, &Accumulator) -> HandlerResult<Verdict>
            + Send
            + Sync
            + 'static,
    {
        let middleware = FnMiddleware::new(func);
        self.register(name, move || middleware.clone())
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the factory for `name`.
    #[must_use]
    pub fn factory(&self, name: &str) -> Option<MiddlewareFactory> {
        self.factories.get(name).cloned()
    }

    /// Checks that `name` is registered and implements `action`.
    pub fn check(&self, name: &str, action: &str) -> Result<MiddlewareFactory, ResolveError> {
        let factory = self
            .factory(name)
            .ok_or_else(|| ResolveError::UnknownType(name.to_string()))?;
        if factory().supports(action) {
            Ok(factory)
        } else {
            Err(ResolveError::UnknownAction {
                middleware: name.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxFuture;

    #[derive(Default)]
    struct Counter {
        calls: usize,
    }

    impl Middleware for Counter {
        fn supports(&self, action: &str) -> bool {
            matches!(action, "handle" | "count")
        }

        fn handle<'a>(
            &'a mut self,
            _action: &'a str,
            _ctx: &'a RequestContext,
            _acc: &'a Accumulator,
        ) -> BoxFuture<'a, HandlerResult<Verdict>> {
            self.calls += 1;
            let calls = self.calls;
            Box::pin(async move { Ok(Verdict::proceed_with([("calls", calls)])) })
        }
    }

    #[test]
    fn test_unknown_type() {
        let registry = MiddlewareRegistry::new();
        assert_eq!(
            registry.check("Auth", "handle").err(),
            Some(ResolveError::UnknownType("Auth".into()))
        );
    }

    #[test]
    fn test_unknown_action() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("Counter", Counter::default);
        assert!(registry.check("Counter", "count").is_ok());
        assert!(matches!(
            registry.check("Counter", "reset"),
            Err(ResolveError::UnknownAction { .. })
        ));
    }

    #[tokio::test]
    async fn test_factory_creates_fresh_instances() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("Counter", Counter::default);
        let factory = registry.factory("Counter").unwrap();
        let ctx = switchyard_core::fixtures::get("/");
        let acc = Accumulator::new();

        for _ in 0..3 {
            let mut instance = factory();
            let verdict = instance.handle("handle", &ctx, &acc).await.unwrap();
            assert_eq!(verdict, Verdict::proceed_with([("calls", 1)]));
        }
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = MiddlewareRegistry::new();
        registry
            .register_fn("Session", |_, _, _| Ok(Verdict::proceed()))
            .register_fn("Auth", |_, _, _| Ok(Verdict::proceed()));
        assert_eq!(registry.names(), vec!["Auth", "Session"]);
    }
}
