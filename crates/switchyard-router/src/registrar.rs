//! Route registration DSL.
//!
//! [`Routes`] is the application-facing way to populate a [`RouteTable`]:
//!
//! ```rust
//! use switchyard_router::Routes;
//!
//! # fn main() -> Result<(), switchyard_router::RouteError> {
//! let mut routes = Routes::new();
//! routes
//!     .get("/", "HomeController@index")?
//!     .post("/login", "AuthController@login")?;
//!
//! routes.with_middleware(&["Auth"], |routes| {
//!     routes.get("/dashboard", "DashboardController@show")?;
//!     routes.with_middleware(&["Admin@check"], |routes| {
//!         routes.delete("/users/{id}[int]", "UserController@destroy")?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//!
//! let table = routes.into_table();
//! assert_eq!(table.len(), 4);
//! # Ok(())
//! # }
//! ```

use crate::{HandlerRef, MiddlewareRef, RouteError, RouteMethod, RouteTable};

/// Builder that registers routes into a [`RouteTable`].
///
/// Middleware scopes opened with [`Routes::with_middleware`] prepend their
/// middleware to every route registered inside them. Nested scopes compose
/// outer-first.
#[derive(Debug, Default)]
pub struct Routes {
    table: RouteTable,
    scope: Vec<MiddlewareRef>,
}

impl Routes {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Get, definition, handler)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Post, definition, handler)
    }

    /// Registers a `PUT` route.
    pub fn put(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Put, definition, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Patch, definition, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Delete, definition, handler)
    }

    /// Registers a `HEAD` route. `HEAD` requests otherwise fall back to the
    /// `GET` route.
    pub fn head(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Head, definition, handler)
    }

    /// Registers an `OPTIONS` route.
    pub fn options(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        self.route(RouteMethod::Options, definition, handler)
    }

    /// Registers the route for `GET`, `POST`, `PUT`, `PATCH` and `DELETE`.
    pub fn any(&mut self, definition: &str, handler: &str) -> Result<&mut Self, RouteError> {
        for method in RouteMethod::ANY {
            self.route(method, definition, handler)?;
        }
        Ok(self)
    }

    /// Registers a route for one method.
    pub fn route(
        &mut self,
        method: RouteMethod,
        definition: &str,
        handler: &str,
    ) -> Result<&mut Self, RouteError> {
        self.route_with::<&str>(method, definition, handler, &[])
    }

    /// Registers a route with route-level middleware, applied after the
    /// enclosing scopes.
    pub fn route_with<S: AsRef<str>>(
        &mut self,
        method: RouteMethod,
        definition: &str,
        handler: &str,
        middleware: &[S],
    ) -> Result<&mut Self, RouteError> {
        let handler: HandlerRef = handler.parse()?;
        let mut chain = self.scope.clone();
        chain.extend(parse_middleware(middleware)?);
        self.table.register_with(method, definition, handler, chain)?;
        Ok(self)
    }

    /// Runs `register` with `middleware` prepended to every route it adds.
    ///
    /// The scope is closed again when `register` returns, including on error.
    pub fn with_middleware<S, F>(
        &mut self,
        middleware: &[S],
        register: F,
    ) -> Result<&mut Self, RouteError>
    where
        S: AsRef<str>,
        F: FnOnce(&mut Self) -> Result<(), RouteError>,
    {
        let refs = parse_middleware(middleware)?;
        let depth = self.scope.len();
        self.scope.extend(refs);
        let result = register(self);
        self.scope.truncate(depth);
        result.map(|()| self)
    }

    /// Returns the table built so far.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Finishes registration.
    #[must_use]
    pub fn into_table(self) -> RouteTable {
        self.table
    }
}

fn parse_middleware<S: AsRef<str>>(middleware: &[S]) -> Result<Vec<MiddlewareRef>, RouteError> {
    middleware.iter().map(|m| m.as_ref().parse()).collect()
}
