//! # Switchyard
//!
//! **HTTP routing and dispatch pipeline**
//!
//! Switchyard turns route definitions such as `/users/{id}[int]` into a
//! compiled, cacheable route table and dispatches each request through
//! parameter validation, CSRF verification, a middleware chain and an
//! injected handler.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchyard::prelude::*;
//!
//! async fn show(params: ParamBag) -> HandlerResult<String> {
//!     Ok(format!("user {}", params.get("id").unwrap_or_default()))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StartupError> {
//!     // routes/users.toml:
//!     //   [[route]]
//!     //   method = "get"
//!     //   path = "/users/{id}[int]"
//!     //   handler = "UserController@show"
//!     App::from_env()?
//!         .handler("UserController@show", show)?
//!         .run()
//!         .await
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → resolve → validate → CSRF → middleware chain → handler
//!             404        403       419          403            500
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;

pub use app::{load_routes, App, CONFIG_FILE, ENV_PREFIX};
pub use error::StartupError;

pub use switchyard_config as config;
pub use switchyard_core as core;
pub use switchyard_middleware as middleware;
pub use switchyard_router as router;
pub use switchyard_server as server;
pub use switchyard_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use switchyard::prelude::*;
///
/// let mut routes = Routes::new();
/// routes.get("/users/{id}[int]", "UserController@show").unwrap();
/// assert_eq!(routes.table().len(), 1);
/// ```
pub mod prelude {
    pub use crate::{App, StartupError};

    pub use switchyard_config::{ConfigLoader, SwitchyardConfig};

    pub use switchyard_core::{
        DispatchFailure, HandlerError, HandlerResult, ParamBag, RecordSink, RequestContext,
        TokenStore,
    };

    pub use switchyard_middleware::{
        Accumulator, FnMiddleware, Middleware, MiddlewareRegistry, Verdict,
    };

    pub use switchyard_router::{RouteCache, RouteTable, Routes};

    pub use switchyard_server::{
        Dispatcher, HandlerRegistry, IntoReply, Reply, ResponseDraft, Server, ShutdownSignal,
    };
}
