//! Start-up errors for the server crate.
//!
//! Everything here is fatal: a route that names an unregistered handler or
//! middleware, or an address that cannot be bound, aborts start-up instead of
//! surfacing on the first request.

use std::net::SocketAddr;

use switchyard_middleware::ResolveError;
use switchyard_router::RouteError;
use thiserror::Error;

/// A route table could not be bound against the registries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A route names a handler that was never registered.
    #[error("route {method} {path} names unknown handler '{handler}'")]
    UnknownHandler {
        /// Route method.
        method: String,
        /// Route path.
        path: String,
        /// The `Controller@action` reference.
        handler: String,
    },

    /// A route names middleware that is unknown or lacks the action.
    #[error("route {method} {path}: {source}")]
    UnknownMiddleware {
        /// Route method.
        method: String,
        /// Route path.
        path: String,
        /// Why resolution failed.
        #[source]
        source: ResolveError,
    },
}

/// Errors that stop the server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that failed.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The route table could not be built or loaded.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The route table could not be bound.
    #[error(transparent)]
    Binding(#[from] BindError),
}
