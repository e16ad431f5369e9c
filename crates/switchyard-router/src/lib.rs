//! Route registration, compilation, caching and validation for Switchyard.
//!
//! This crate turns route definition strings into a method-partitioned
//! [`RouteTable`] and validates request parameters against each route's type
//! contract.
//!
//! # Features
//!
//! - **Definition parsing**: `{name}` and `{name}[type]` placeholders, a
//!   `?[type name]` query-constraint block and an `@api` marker
//! - **Compiled matchers**: anchored, escaped patterns with one named capture
//!   per placeholder
//! - **Two partitions**: exact literal lookup first, then dynamic patterns in
//!   registration order (first match wins)
//! - **Route cache**: one JSON artifact, invalidated when any source is newer
//! - **Whitelist validation**: typed parameters with a `*` wildcard
//!
//! # Example
//!
//! ```rust
//! use switchyard_core::ParamBag;
//! use switchyard_router::{validate, Routes};
//! use http::Method;
//!
//! let mut routes = Routes::new();
//! routes.get("/users/{id}[int]", "UserController@show").unwrap();
//! let table = routes.into_table();
//!
//! let found = table.lookup(&Method::GET, "/users/42").unwrap();
//! assert_eq!(found.params.get("id"), Some("42"));
//! assert!(validate(&found.params, &found.entry.field_types).is_valid());
//!
//! let found = table.lookup(&Method::GET, "/users/abc").unwrap();
//! assert!(!validate(&found.params, &found.entry.field_types).is_valid());
//! ```
//!
//! # Architecture
//!
//! ```text
//!   "/users/{id}[int]"  ──parse──▶  ParsedRoute  ──compile──▶  CompiledMatcher
//!                                        │                          │
//!                                        ▼                          ▼
//!                               RouteTable { exact, dynamic }  ◀────┘
//!                                        │
//!                              RouteCache (JSON artifact)
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod definition;
mod error;
mod matcher;
mod method;
mod refs;
mod registrar;
pub mod source;
mod table;
mod validate;

pub use cache::{MissReason, RouteCache, CACHE_METRIC};
pub use definition::{parse, FieldTypes, ParsedRoute, TypeTag, API_MARKER, WILDCARD};
pub use error::RouteError;
pub use matcher::CompiledMatcher;
pub use method::{RouteMethod, UnknownMethod};
pub use refs::{HandlerRef, MiddlewareRef, DEFAULT_MIDDLEWARE_ACTION};
pub use registrar::Routes;
pub use table::{DynamicRoute, RouteEntry, RouteMatch, RouteTable};
pub use validate::{validate, ValidationFailure, ValidationReport};
