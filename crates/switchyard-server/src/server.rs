//! HTTP server loop.
//!
//! Binds a TCP listener, serves HTTP/1.1 connections with Hyper, collects each
//! body under the request timeout and hands the request to the
//! [`Dispatcher`].
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_server::{Dispatcher, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(config.server.clone(), dispatcher);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use switchyard_config::ServerConfig;
use switchyard_core::RequestContext;
use tokio::net::{TcpListener, TcpStream};

use crate::dispatch::Dispatcher;
use crate::error::ServerError;
use crate::response::HttpResponse;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The Switchyard HTTP server.
#[derive(Debug, Clone)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.config.shutdown_timeout_secs)
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .http_addr
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.config.http_addr.clone()))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already-bound listener until `shutdown` fires.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => {
                tracing::info!(%addr, routes = self.dispatcher.router().len(), "server listening");
            }
            Err(e) => tracing::warn!(error = %e, "listener has no local address"),
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) =
                                    server.handle_connection(stream, remote_addr, shutdown).await
                                {
                                    tracing::debug!(%remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let shutdown_timeout = server.shutdown_timeout();
        tracing::info!(
            timeout = ?shutdown_timeout,
            active = tracker.active_connections(),
            "waiting for connections to close"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("server stopped");
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);

        tokio::select! {
            result = conn => result,
            () = shutdown.recv() => {
                tracing::debug!(%remote_addr, "connection closed by shutdown");
                Ok(())
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, Infallible> {
        let (parts, body) = req.into_parts();
        let timeout = self.request_timeout();

        let body = match tokio::time::timeout(timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(
                    method = %parts.method,
                    path = parts.uri.path(),
                    error = %e,
                    "failed to read request body"
                );
                return Ok(transport_error(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "Failed to read request body",
                ));
            }
            Err(_) => {
                tracing::warn!(
                    method = %parts.method,
                    path = parts.uri.path(),
                    "request body timed out"
                );
                return Ok(transport_error(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "Request body collection timed out",
                ));
            }
        };

        let ctx = RequestContext::new(parts.method, parts.uri, parts.headers, body);
        let request_id = ctx.request_id();

        match tokio::time::timeout(timeout, self.dispatcher.dispatch(ctx)).await {
            Ok(response) => Ok(response),
            Err(_) => {
                tracing::warn!(request_id = %request_id, "dispatch timed out");
                Ok(transport_error(
                    StatusCode::GATEWAY_TIMEOUT,
                    "HANDLER_TIMEOUT",
                    "Handler execution timed out",
                ))
            }
        }
    }
}

/// Builds an error response for failures outside the dispatcher.
fn transport_error(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    let body = json!({ "error": { "code": code, "message": message } });
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(http_body_util::Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| http::Response::new(http_body_util::Full::new(Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandlerRegistry, Router};
    use switchyard_middleware::MiddlewareRegistry;
    use switchyard_router::Routes;

    fn server(http_addr: &str) -> Server {
        let router = Router::bind(
            Routes::new().into_table(),
            &HandlerRegistry::new(),
            &MiddlewareRegistry::new(),
        )
        .unwrap();
        let config = ServerConfig {
            http_addr: http_addr.to_string(),
            shutdown_timeout_secs: 1,
            ..ServerConfig::default()
        };
        Server::new(config, Dispatcher::new(Arc::new(router)))
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let result = server("not-a-valid-address")
            .run_with_shutdown(ShutdownSignal::new())
            .await;
        assert!(matches!(result, Err(ServerError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server("127.0.0.1:0").run_with_shutdown(shutdown),
        )
        .await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }

    #[test]
    fn test_timeouts_from_config() {
        let server = server("127.0.0.1:0");
        assert_eq!(server.request_timeout(), Duration::from_millis(30_000));
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_transport_error_shape() {
        let response = transport_error(StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", "slow");
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");
    }
}
