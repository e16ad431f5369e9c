//! # Switchyard Middleware
//!
//! Route middleware and the chain executor for the Switchyard dispatch
//! pipeline.
//!
//! Routes name their middleware as `Type@action`. At start-up each list is
//! resolved against a [`MiddlewareRegistry`] into a [`MiddlewareChain`]; per
//! request the chain creates fresh instances and runs them in order.
//!
//! ## Chain Semantics
//!
//! ```text
//! Request → M1 ──Proceed(data)──▶ M2 ──Proceed(data)──▶ M3 ──▶ Completed(acc) → Handler
//!                                  │
//!                                  └──Reject(reason)──▶ Rejected (403, acc dropped)
//! ```
//!
//! | Verdict                | Effect                                           |
//! |------------------------|--------------------------------------------------|
//! | `Proceed(data)`        | merge `data`, continue                           |
//! | `Reject(reason)`       | stop; handler never runs; accumulated data lost  |
//! | `Err(HandlerError)`    | stop; propagates to the dispatcher (500)         |
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::{MiddlewareChain, MiddlewareRegistry, Verdict};
//!
//! let mut registry = MiddlewareRegistry::new();
//! registry.register_fn("Auth", |_, ctx, _| {
//!     Ok(Verdict::from(ctx.header("authorization").is_some()))
//! });
//!
//! let chain = MiddlewareChain::resolve(&["Auth".parse().unwrap()], &registry).unwrap();
//! assert_eq!(chain.len(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod accumulator;
pub mod chain;
pub mod middleware;
pub mod registry;

pub use accumulator::Accumulator;
pub use chain::{ChainOutcome, MiddlewareChain};
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Verdict, DEFAULT_ACTION};
pub use registry::{MiddlewareFactory, MiddlewareRegistry, ResolveError};
