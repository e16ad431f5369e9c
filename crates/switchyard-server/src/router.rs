//! Binding a route table to handlers and middleware.
//!
//! A [`Router`] is built once on the start-up path. Binding checks that every
//! route's handler is registered and that every middleware reference resolves,
//! so a typo fails start-up instead of the first request that hits it. The
//! result is immutable and shared across requests behind an `Arc`.

use std::collections::HashMap;

use http::Method;
use switchyard_core::ParamBag;
use switchyard_middleware::{MiddlewareChain, MiddlewareRegistry};
use switchyard_router::{HandlerRef, MiddlewareRef, RouteEntry, RouteTable};

use crate::error::BindError;
use crate::handler::{BoundHandler, HandlerRegistry};

/// A route resolved for one request.
#[derive(Debug)]
pub struct ResolvedRoute<'a> {
    /// The matched route.
    pub entry: &'a RouteEntry,
    /// Raw path captures.
    pub captures: ParamBag,
    /// The route's handler.
    pub handler: &'a BoundHandler,
    /// The route's middleware chain.
    pub chain: &'a MiddlewareChain,
}

/// A route table bound to handlers and middleware chains.
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    handlers: HashMap<HandlerRef, BoundHandler>,
    chains: HashMap<Vec<MiddlewareRef>, MiddlewareChain>,
}

impl Router {
    /// Binds every route in `table`.
    ///
    /// Routes sharing a middleware list share one resolved chain.
    ///
    /// # Errors
    ///
    /// Returns `BindError::UnknownHandler` or `BindError::UnknownMiddleware`
    /// for the first route that cannot be bound.
    pub fn bind(
        table: RouteTable,
        handlers: &HandlerRegistry,
        middleware: &MiddlewareRegistry,
    ) -> Result<Self, BindError> {
        let mut bound_handlers = HashMap::new();
        let mut chains = HashMap::new();

        for (method, entry) in table.routes() {
            if !bound_handlers.contains_key(&entry.handler) {
                let handler = handlers.get(&entry.handler).ok_or_else(|| BindError::UnknownHandler {
                    method: method.to_string(),
                    path: entry.path.clone(),
                    handler: entry.handler.to_string(),
                })?;
                bound_handlers.insert(entry.handler.clone(), handler.clone());
            }

            if !chains.contains_key(&entry.middleware) {
                let chain = MiddlewareChain::resolve(&entry.middleware, middleware).map_err(|source| {
                    BindError::UnknownMiddleware {
                        method: method.to_string(),
                        path: entry.path.clone(),
                        source,
                    }
                })?;
                chains.insert(entry.middleware.clone(), chain);
            }
        }

        tracing::info!(
            routes = table.len(),
            handlers = bound_handlers.len(),
            chains = chains.len(),
            "route table bound"
        );

        Ok(Self {
            table,
            handlers: bound_handlers,
            chains,
        })
    }

    /// Resolves a request to its route, handler and chain.
    ///
    /// Returns `None` when no route matches.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute<'_>> {
        let found = self.table.lookup(method, path)?;
        let handler = self.handlers.get(&found.entry.handler)?;
        let chain = self.chains.get(&found.entry.middleware)?;
        Some(ResolvedRoute {
            entry: found.entry,
            captures: found.params,
            handler,
            chain,
        })
    }

    /// Returns the underlying route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if there are no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{HandlerResult, ParamBag};
    use switchyard_middleware::{ResolveError, Verdict};
    use switchyard_router::Routes;

    async fn show(_params: ParamBag) -> HandlerResult<()> {
        Ok(())
    }

    fn handlers() -> HandlerRegistry {
        let mut handlers = HandlerRegistry::new();
        handlers.register("User@show", show).unwrap();
        handlers.register("User@index", show).unwrap();
        handlers
    }

    fn middleware() -> MiddlewareRegistry {
        let mut registry = MiddlewareRegistry::new();
        registry.register_fn("Auth", |_, _, _| Ok(Verdict::proceed()));
        registry
    }

    #[test]
    fn test_bind_and_resolve() {
        let mut routes = Routes::new();
        routes
            .with_middleware(&["Auth"], |r| {
                r.get("/users/{id}[int]", "User@show")?;
                r.get("/users", "User@index")?;
                Ok(())
            })
            .unwrap();

        let router = Router::bind(routes.into_table(), &handlers(), &middleware()).unwrap();
        assert_eq!(router.len(), 2);

        let resolved = router.resolve(&Method::GET, "/users/42").unwrap();
        assert_eq!(resolved.captures.get("id"), Some("42"));
        assert_eq!(resolved.handler.reference().to_string(), "User@show");
        assert_eq!(resolved.chain.labels().collect::<Vec<_>>(), ["Auth@handle"]);

        assert!(router.resolve(&Method::POST, "/users/42").is_none());
    }

    #[test]
    fn test_unknown_handler_fails_fast() {
        let mut routes = Routes::new();
        routes.get("/posts", "Post@index").unwrap();

        let err = Router::bind(routes.into_table(), &handlers(), &middleware()).unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownHandler {
                method: "GET".to_string(),
                path: "/posts".to_string(),
                handler: "Post@index".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_middleware_fails_fast() {
        let mut routes = Routes::new();
        routes
            .with_middleware(&["Throttle"], |r| {
                r.get("/users", "User@index")?;
                Ok(())
            })
            .unwrap();

        let err = Router::bind(routes.into_table(), &handlers(), &middleware()).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnknownMiddleware {
                source: ResolveError::UnknownType(ref name),
                ..
            } if name == "Throttle"
        ));
    }

    #[test]
    fn test_unknown_middleware_action_fails_fast() {
        let mut routes = Routes::new();
        routes
            .with_middleware(&["Auth@admin"], |r| {
                r.get("/admin", "User@index")?;
                Ok(())
            })
            .unwrap();

        let err = Router::bind(routes.into_table(), &handlers(), &middleware()).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnknownMiddleware {
                source: ResolveError::UnknownAction { .. },
                ..
            }
        ));
    }
}
