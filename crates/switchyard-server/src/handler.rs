//! Handler registration and invocation.
//!
//! Handlers are async functions (or closures) of up to four injectable
//! arguments, registered under a `Controller@action` reference:
//!
//! ```
//! use switchyard_core::{HandlerResult, ParamBag, RequestContext};
//! use switchyard_server::{HandlerRegistry, InjectKind, ResponseDraft};
//!
//! async fn show(params: ParamBag) -> HandlerResult<String> {
//!     Ok(format!("user {}", params.get("id").unwrap_or("?")))
//! }
//!
//! async fn store(req: RequestContext, res: ResponseDraft) -> HandlerResult<()> {
//!     res.set_status(http::StatusCode::CREATED);
//!     res.write(req.body().clone());
//!     Ok(())
//! }
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register("UserController@show", show).unwrap();
//! handlers.register("UserController@store", store).unwrap();
//!
//! let bound = handlers.get(&"UserController@store".parse().unwrap()).unwrap();
//! assert_eq!(bound.signature(), &[InjectKind::Request, InjectKind::Response]);
//! ```
//!
//! The argument kinds are recorded once, at registration. Per request the
//! dispatcher only builds the recorded arguments and calls the function.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use switchyard_core::HandlerResult;
use switchyard_middleware::BoxFuture;
use switchyard_router::{HandlerRef, RouteError};

use crate::inject::{Inject, InjectKind, Invocation};
use crate::response::{IntoReply, Reply};

/// An async function usable as a route handler.
///
/// Implemented for every `Fn` of zero to four [`Inject`] arguments returning
/// a future of `HandlerResult<R>` where `R: IntoReply`. `Args` is the tuple
/// of argument types and only serves to keep the implementations apart.
pub trait Handler<Args>: Clone + Send + Sync + 'static {
    /// The argument kinds, in declaration order.
    fn signature() -> Vec<InjectKind>;

    /// Builds the arguments from the invocation and calls the handler.
    ///
    /// The handler body runs when the returned future is polled.
    fn call(&self, invocation: &Invocation) -> BoxFuture<'static, HandlerResult<Reply>>;
}

macro_rules! impl_handler_for_fn {
    ($($A:ident),*) => {
        impl<F, Fut, R, $($A,)*> Handler<($($A,)*)> for F
        where
            F: Fn($($A),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = HandlerResult<R>> + Send + 'static,
            R: IntoReply,
            $($A: Inject,)*
        {
            fn signature() -> Vec<InjectKind> {
                vec![$(<$A as Inject>::KIND),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(&self, invocation: &Invocation) -> BoxFuture<'static, HandlerResult<Reply>> {
                $(let $A = <$A as Inject>::inject(invocation);)*
                let handler = self.clone();
                Box::pin(async move { handler($($A),*).await.map(IntoReply::into_reply) })
            }
        }
    };
}

impl_handler_for_fn!();
impl_handler_for_fn!(A1);
impl_handler_for_fn!(A1, A2);
impl_handler_for_fn!(A1, A2, A3);
impl_handler_for_fn!(A1, A2, A3, A4);

type ErasedHandler =
    Arc<dyn Fn(&Invocation) -> BoxFuture<'static, HandlerResult<Reply>> + Send + Sync>;

/// A registered handler with its recorded signature.
#[derive(Clone)]
pub struct BoundHandler {
    reference: HandlerRef,
    signature: Vec<InjectKind>,
    call: ErasedHandler,
}

impl BoundHandler {
    fn new<H, Args>(reference: HandlerRef, handler: H) -> Self
    where
        H: Handler<Args>,
    {
        Self {
            reference,
            signature: H::signature(),
            call: Arc::new(move |invocation: &Invocation| handler.call(invocation)),
        }
    }

    /// Returns the `Controller@action` reference.
    #[must_use]
    pub fn reference(&self) -> &HandlerRef {
        &self.reference
    }

    /// Returns the argument kinds, in declaration order.
    #[must_use]
    pub fn signature(&self) -> &[InjectKind] {
        &self.signature
    }

    /// Invokes the handler.
    pub fn invoke(&self, invocation: &Invocation) -> BoxFuture<'static, HandlerResult<Reply>> {
        (self.call)(invocation)
    }
}

impl fmt::Debug for BoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandler")
            .field("reference", &self.reference.to_string())
            .field("signature", &self.signature)
            .finish()
    }
}

/// Registry of handlers keyed by `Controller@action`.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerRef, BoundHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a `Controller@action` reference.
    ///
    /// Registering the same reference twice replaces the earlier handler.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::Malformed` if `reference` is not `Controller@action`.
    pub fn register<H, Args>(&mut self, reference: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Handler<Args>,
    {
        let reference: HandlerRef = reference.parse()?;
        Ok(self.register_ref(reference, handler))
    }

    /// Registers a handler under an already-parsed reference.
    pub fn register_ref<H, Args>(&mut self, reference: HandlerRef, handler: H) -> &mut Self
    where
        H: Handler<Args>,
    {
        let bound = BoundHandler::new(reference.clone(), handler);
        tracing::debug!(
            handler = %reference,
            signature = ?bound.signature(),
            "registered handler"
        );
        self.handlers.insert(reference, bound);
        self
    }

    /// Returns the handler registered under `reference`.
    #[must_use]
    pub fn get(&self, reference: &HandlerRef) -> Option<&BoundHandler> {
        self.handlers.get(reference)
    }

    /// Returns true if a handler is registered under `reference`.
    #[must_use]
    pub fn contains(&self, reference: &HandlerRef) -> bool {
        self.handlers.contains_key(reference)
    }

    /// Returns the registered references, sorted.
    #[must_use]
    pub fn references(&self) -> Vec<&HandlerRef> {
        let mut refs: Vec<&HandlerRef> = self.handlers.keys().collect();
        refs.sort_unstable();
        refs
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.references())
            .finish()
    }
}
