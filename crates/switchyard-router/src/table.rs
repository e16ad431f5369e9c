//! The route table.
//!
//! Routes live in two partitions per method:
//!
//! - **exact**: literal paths, found with a hash lookup
//! - **dynamic**: compiled matchers, scanned in registration order
//!
//! Lookup probes the exact partition first. On a miss it returns the first
//! dynamic route whose matcher accepts the path. There is no "most specific"
//! reordering: an application that wants `/users/me` to beat `/users/{id}`
//! registers it as a literal, or registers the narrower pattern first.

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use switchyard_core::ParamBag;

use crate::definition::{parse, FieldTypes};
use crate::{CompiledMatcher, HandlerRef, MiddlewareRef, RouteError, RouteMethod};

/// Everything the dispatcher needs to serve one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Clean path the route was registered with.
    pub path: String,
    /// Handler to invoke.
    pub handler: HandlerRef,
    /// Permitted parameters and their types.
    pub field_types: FieldTypes,
    /// Middleware to run before the handler, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<MiddlewareRef>,
    /// API routes skip CSRF verification.
    #[serde(default)]
    pub is_api: bool,
}

/// A compiled matcher and the route it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicRoute {
    /// Matcher for the route's path.
    pub matcher: CompiledMatcher,
    /// The route.
    pub entry: RouteEntry,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matched route.
    pub entry: &'a RouteEntry,
    /// Raw path captures, keyed by placeholder name.
    pub params: ParamBag,
}

/// Method-partitioned route table.
///
/// Built once at start-up and immutable afterwards. Serialization is
/// deterministic: partitions keep insertion order, so rebuilding the same
/// sources yields byte-identical output.
///
/// # Example
///
/// ```rust
/// use switchyard_router::{RouteMethod, RouteTable};
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.register(RouteMethod::Get, "/users", "UserController@index".parse().unwrap()).unwrap();
/// table.register(RouteMethod::Get, "/users/{id}[int]", "UserController@show".parse().unwrap()).unwrap();
///
/// let found = table.lookup(&Method::GET, "/users/42").unwrap();
/// assert_eq!(found.entry.handler.action(), "show");
/// assert_eq!(found.params.get("id"), Some("42"));
///
/// assert!(table.lookup(&Method::DELETE, "/users").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    exact: IndexMap<RouteMethod, IndexMap<String, RouteEntry>>,
    dynamic: IndexMap<RouteMethod, Vec<DynamicRoute>>,
}

impl RouteTable {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route without middleware.
    pub fn register(
        &mut self,
        method: RouteMethod,
        definition: &str,
        handler: HandlerRef,
    ) -> Result<(), RouteError> {
        self.register_with(method, definition, handler, Vec::new())
    }

    /// Registers a route with its middleware list.
    ///
    /// Registering a literal path twice for one method replaces the earlier
    /// entry. Dynamic routes are appended and never replaced.
    pub fn register_with(
        &mut self,
        method: RouteMethod,
        definition: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        let parsed = parse(definition)?;
        let entry = RouteEntry {
            path: parsed.clean_path.clone(),
            handler,
            field_types: parsed.field_types.clone(),
            middleware,
            is_api: parsed.is_api,
        };

        if parsed.is_dynamic {
            let matcher = CompiledMatcher::compile(&parsed)?;
            tracing::debug!(
                method = %method,
                pattern = %matcher.as_str(),
                handler = %entry.handler,
                "registered dynamic route"
            );
            self.dynamic
                .entry(method)
                .or_default()
                .push(DynamicRoute { matcher, entry });
        } else {
            tracing::debug!(
                method = %method,
                path = %entry.path,
                handler = %entry.handler,
                "registered static route"
            );
            let previous = self
                .exact
                .entry(method)
                .or_default()
                .insert(parsed.clean_path, entry);
            if let Some(previous) = previous {
                tracing::debug!(
                    method = %method,
                    path = %previous.path,
                    replaced = %previous.handler,
                    "static route replaced"
                );
            }
        }
        Ok(())
    }

    /// Resolves a request method and decoded path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.lookup_route(RouteMethod::from_http(method)?, path)
    }

    /// Resolves a route method and decoded path.
    ///
    /// `HEAD` falls back to the `GET` route when no `HEAD` route matches.
    #[must_use]
    pub fn lookup_route(&self, method: RouteMethod, path: &str) -> Option<RouteMatch<'_>> {
        match self.find(method, path) {
            None if method == RouteMethod::Head => self.find(RouteMethod::Get, path),
            found => found,
        }
    }

    fn find(&self, method: RouteMethod, path: &str) -> Option<RouteMatch<'_>> {
        if let Some(entry) = self.exact.get(&method).and_then(|paths| paths.get(path)) {
            return Some(RouteMatch {
                entry,
                params: ParamBag::new(),
            });
        }

        self.dynamic.get(&method)?.iter().find_map(|route| {
            route.matcher.captures(path).map(|params| RouteMatch {
                entry: &route.entry,
                params,
            })
        })
    }

    /// Returns every route with its method, exact partition first.
    pub fn routes(&self) -> impl Iterator<Item = (RouteMethod, &RouteEntry)> {
        let exact = self
            .exact
            .iter()
            .flat_map(|(method, paths)| paths.values().map(move |entry| (*method, entry)));
        let dynamic = self.dynamic.iter().flat_map(|(method, routes)| {
            routes.iter().map(move |route| (*method, &route.entry))
        });
        exact.chain(dynamic)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.values().map(IndexMap::len).sum::<usize>()
            + self.dynamic.values().map(Vec::len).sum::<usize>()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the table to its canonical JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>, RouteError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Restores a table from its JSON form, recompiling every matcher.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
