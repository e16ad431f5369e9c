//! Per-request dispatch.
//!
//! ```text
//! resolve ──miss──▶ 404
//!    │
//! merge params + validate ──fail──▶ 403
//!    │
//! CSRF (web routes, POST/PUT/PATCH/DELETE) ──fail──▶ 419
//!    │
//! middleware chain ──reject──▶ 403
//!    │
//! inject arguments + invoke handler ──error/panic──▶ 500
//!    │
//! handler response
//! ```
//!
//! Every failure past route resolution is logged and handed to the
//! [`RecordSink`]. Clients get a JSON error envelope with a generic message,
//! plus diagnostics when debug mode is on. Nothing is retried.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use http::header::HeaderValue;
use switchyard_config::{CsrfConfig, SwitchyardConfig};
use switchyard_core::{
    DispatchFailure, HandlerError, HandlerResult, MemoryTokenStore, RecordSink, RequestContext,
    TokenStore, TracingSink,
};
use switchyard_middleware::ChainOutcome;
use switchyard_router::validate;

use crate::csrf::CsrfGuard;
use crate::inject::Invocation;
use crate::input::{merge_params, BodyInput};
use crate::response::{error_response, HttpResponse, ResponseDraft};
use crate::router::Router;

/// Response header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Dispatches requests against a bound [`Router`].
///
/// Cheap to clone; all state is shared and read-only.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use switchyard_core::{fixtures, HandlerResult, ParamBag};
/// use switchyard_middleware::MiddlewareRegistry;
/// use switchyard_router::Routes;
/// use switchyard_server::{Dispatcher, HandlerRegistry, Router};
///
/// async fn show(params: ParamBag) -> HandlerResult<String> {
///     Ok(format!("user {}", params.get("id").unwrap_or_default()))
/// }
///
/// # tokio_test::block_on(async {
/// let mut routes = Routes::new();
/// routes.get("/users/{id}[int]", "UserController@show").unwrap();
///
/// let mut handlers = HandlerRegistry::new();
/// handlers.register("UserController@show", show).unwrap();
///
/// let router = Router::bind(routes.into_table(), &handlers, &MiddlewareRegistry::new()).unwrap();
/// let dispatcher = Dispatcher::new(Arc::new(router));
///
/// let ok = dispatcher.dispatch(fixtures::get("/users/42")).await;
/// assert_eq!(ok.status(), 200);
///
/// let rejected = dispatcher.dispatch(fixtures::get("/users/abc")).await;
/// assert_eq!(rejected.status(), 403);
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    csrf: CsrfGuard,
    sink: Arc<dyn RecordSink>,
    debug: bool,
}

impl Dispatcher {
    /// Creates a dispatcher with default CSRF settings, an empty token store,
    /// the tracing record sink and debug mode off.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            csrf: CsrfGuard::new(Arc::new(MemoryTokenStore::new()), &CsrfConfig::default()),
            sink: Arc::new(TracingSink),
            debug: false,
        }
    }

    /// Creates a dispatcher configured from `config`.
    #[must_use]
    pub fn from_config(
        router: Arc<Router>,
        config: &SwitchyardConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self::new(router)
            .with_csrf(CsrfGuard::new(tokens, &config.csrf))
            .with_debug(config.app.debug)
    }

    /// Replaces the CSRF guard.
    #[must_use]
    pub fn with_csrf(mut self, csrf: CsrfGuard) -> Self {
        self.csrf = csrf;
        self
    }

    /// Replaces the record sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Enables or disables debug diagnostics in error responses.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Returns true if debug mode is on.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Dispatches one request and always produces a response.
    pub async fn dispatch(&self, mut ctx: RequestContext) -> HttpResponse {
        let started = Instant::now();

        let mut response = match self.run(&mut ctx).await {
            Ok(response) => response,
            Err(failure) => self.fail(&ctx, &failure),
        };

        if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let elapsed = started.elapsed();
        switchyard_telemetry::record_dispatch(response.status().as_u16(), elapsed);
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = ctx.path(),
            status = response.status().as_u16(),
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "request dispatched"
        );

        response
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<HttpResponse, DispatchFailure> {
        let not_found = || DispatchFailure::NotFound {
            method: ctx.method().to_string(),
            path: ctx.path().to_string(),
        };
        let path = ctx.decoded_path().ok_or_else(not_found)?.into_owned();
        let resolved = self
            .router
            .resolve(ctx.method(), &path)
            .ok_or_else(not_found)?;

        tracing::debug!(
            request_id = %ctx.request_id(),
            route = %resolved.entry.path,
            handler = %resolved.entry.handler,
            "route resolved"
        );

        let body = BodyInput::parse(ctx);
        let params = merge_params(resolved.captures, ctx, &body, self.csrf.token_name());
        if let Some(failure) = validate(&params, &resolved.entry.field_types).into_error() {
            return Err(DispatchFailure::Validation {
                field: failure.field,
                reason: failure.reason,
            });
        }
        ctx.set_params(params);

        if self.csrf.applies(resolved.entry, ctx) {
            self.csrf.verify(ctx, &body)?;
        }

        let accumulator = match guarded(resolved.chain.run(ctx)).await? {
            ChainOutcome::Completed(accumulator) => accumulator,
            ChainOutcome::Rejected { middleware, reason } => {
                return Err(DispatchFailure::MiddlewareRejection { middleware, reason });
            }
        };

        let draft = ResponseDraft::new();
        let invocation = Invocation::new(ctx.clone(), draft.clone(), accumulator);
        let reply = guarded(resolved.handler.invoke(&invocation)).await?;

        Ok(reply.finish(&draft))
    }

    fn fail(&self, ctx: &RequestContext, failure: &DispatchFailure) -> HttpResponse {
        let category = failure.category();
        let status = failure.status_code();
        let request_id = ctx.request_id().to_string();

        match failure {
            DispatchFailure::NotFound { .. } => {
                tracing::debug!(
                    request_id = %request_id,
                    method = %ctx.method(),
                    path = ctx.path(),
                    "no route matched"
                );
            }
            DispatchFailure::Handler(err) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %ctx.method(),
                    path = ctx.path(),
                    error = %err,
                    location = %err.location(),
                    "handler failed"
                );
                self.record(ctx, failure);
            }
            _ => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %ctx.method(),
                    path = ctx.path(),
                    category = category.as_str(),
                    error = %failure,
                    "request rejected"
                );
                self.record(ctx, failure);
            }
        }

        error_response(status, &failure.to_envelope(Some(&request_id), self.debug))
    }

    /// Hands a failure to the record sink. Sink errors and panics are dropped.
    fn record(&self, ctx: &RequestContext, failure: &DispatchFailure) {
        let mut payload = failure.log_fields();
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("request_id".into(), ctx.request_id().to_string().into());
            fields.insert("request_method".into(), ctx.method().as_str().into());
            fields.insert("request_path".into(), ctx.path().into());
        }

        let category = failure.category().as_str();
        match std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.record(category, &payload))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(request_id = %ctx.request_id(), error = %e, "record sink failed");
            }
            Err(_) => {
                tracing::debug!(request_id = %ctx.request_id(), "record sink panicked");
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("csrf", &self.csrf)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Runs a middleware or handler future, turning a panic into a `HandlerError`.
async fn guarded<F, T>(future: F) -> HandlerResult<T>
where
    F: Future<Output = HandlerResult<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::from_panic(payload.as_ref())),
    }
}
