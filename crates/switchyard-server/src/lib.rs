//! # Switchyard Server
//!
//! Handler binding, CSRF verification, request dispatch and the HTTP server
//! loop for Switchyard.
//!
//! ## Start-up
//!
//! ```text
//! RouteTable ──────────┐
//! HandlerRegistry ─────┼── Router::bind ──▶ Router ──▶ Dispatcher ──▶ Server
//! MiddlewareRegistry ──┘
//! ```
//!
//! Binding fails fast on an unknown handler or middleware.
//!
//! ## Per request
//!
//! | Step                      | Failure status |
//! |---------------------------|----------------|
//! | route resolution          | 404            |
//! | parameter validation      | 403            |
//! | CSRF (web routes only)    | 419            |
//! | middleware chain          | 403            |
//! | handler (error or panic)  | 500            |
//!
//! Handlers take up to four injected arguments, chosen by type:
//! [`RequestContext`](switchyard_core::RequestContext), [`ResponseDraft`],
//! [`Accumulator`](switchyard_middleware::Accumulator) or
//! [`ParamBag`](switchyard_core::ParamBag).

#![doc(html_root_url = "https://docs.rs/switchyard-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csrf;
mod dispatch;
mod error;
mod handler;
mod inject;
mod input;
mod response;
mod router;
mod server;
pub mod shutdown;

pub use csrf::CsrfGuard;
pub use dispatch::{Dispatcher, REQUEST_ID_HEADER};
pub use error::{BindError, ServerError};
pub use handler::{BoundHandler, Handler, HandlerRegistry};
pub use inject::{Inject, InjectKind, Invocation};
pub use response::{error_response, HttpResponse, IntoReply, Reply, ResponseBody, ResponseDraft};
pub use router::{ResolvedRoute, Router};
pub use server::Server;
pub use shutdown::ShutdownSignal;
