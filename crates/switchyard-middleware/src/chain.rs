//! Sequential middleware chain execution.
//!
//! A chain is resolved once, when routes are bound, and then executed per
//! request:
//!
//! ```text
//! PENDING ─▶ RUNNING(0) ─▶ RUNNING(1) ─▶ ... ─▶ COMPLETED(accumulator)
//!                │              │
//!                └──────────────┴──▶ REJECTED(middleware, reason)
//! ```
//!
//! Middleware run strictly one after another. Data returned by a middleware
//! is merged into a request-local accumulator; on rejection that accumulator
//! is dropped, so nothing contributed before the rejection reaches the
//! handler. Errors are not caught here: they propagate to the dispatcher.

use switchyard_core::{HandlerResult, RequestContext};
use switchyard_router::MiddlewareRef;

use crate::registry::{MiddlewareFactory, MiddlewareRegistry, ResolveError};
use crate::{Accumulator, Verdict};

/// Result of running a chain to the end or to a rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// Every middleware proceeded.
    Completed(Accumulator),
    /// A middleware rejected the request.
    Rejected {
        /// The rejecting middleware, as `Type@action`.
        middleware: String,
        /// Reason supplied by the middleware, if any.
        reason: Option<String>,
    },
}

impl ChainOutcome {
    /// Returns true if the chain completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

struct Step {
    label: String,
    action: String,
    factory: MiddlewareFactory,
}

/// A resolved, ordered middleware chain.
///
/// # Example
///
/// ```
/// use switchyard_core::fixtures;
/// use switchyard_middleware::{ChainOutcome, MiddlewareChain, MiddlewareRegistry, Verdict};
///
/// # tokio_test::block_on(async {
/// let mut registry = MiddlewareRegistry::new();
/// registry.register_fn("Session", |_, _, _| Ok(Verdict::proceed_with([("session", "s1")])));
/// registry.register_fn("Auth", |_, _, acc| Ok(Verdict::from(acc.contains_key("session"))));
///
/// let refs = ["Session".parse().unwrap(), "Auth".parse().unwrap()];
/// let chain = MiddlewareChain::resolve(&refs, &registry).unwrap();
///
/// let outcome = chain.run(&fixtures::get("/dashboard")).await.unwrap();
/// let ChainOutcome::Completed(acc) = outcome else { panic!("rejected") };
/// assert_eq!(acc.get_str("session"), Some("s1"));
/// # });
/// ```
#[derive(Default)]
pub struct MiddlewareChain {
    steps: Vec<Step>,
}

impl MiddlewareChain {
    /// An empty chain, which always completes with an empty accumulator.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolves middleware references against a registry.
    ///
    /// Fails on the first unknown type or action.
    pub fn resolve(
        refs: &[MiddlewareRef],
        registry: &MiddlewareRegistry,
    ) -> Result<Self, ResolveError> {
        let steps = refs
            .iter()
            .map(|r| {
                let factory = registry.check(r.middleware_type(), r.action())?;
                Ok(Step {
                    label: r.to_string(),
                    action: r.action().to_string(),
                    factory,
                })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;
        Ok(Self { steps })
    }

    /// Returns the number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the chain has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the chain as `Type@action` labels, in execution order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.label.as_str())
    }

    /// Runs the chain for one request.
    pub async fn run(&self, ctx: &RequestContext) -> HandlerResult<ChainOutcome> {
        let mut acc = Accumulator::new();

        for (index, step) in self.steps.iter().enumerate() {
            tracing::trace!(
                request_id = %ctx.request_id(),
                index,
                middleware = %step.label,
                "running middleware"
            );

            let mut instance = (step.factory)();
            match instance.handle(&step.action, ctx, &acc).await? {
                Verdict::Proceed(data) => acc.merge(data),
                Verdict::Reject(reason) => {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        index,
                        middleware = %step.label,
                        reason = reason.as_deref().unwrap_or(""),
                        "middleware rejected request"
                    );
                    return Ok(ChainOutcome::Rejected {
                        middleware: step.label.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(ChainOutcome::Completed(acc))
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.labels()).finish()
    }
}
