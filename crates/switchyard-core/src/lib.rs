//! # Switchyard Core
//!
//! Core types and traits shared by every stage of the Switchyard routing and
//! dispatch pipeline.
//!
//! This crate provides the foundational types used throughout Switchyard:
//!
//! - [`RequestContext`] - Per-request state (method, path, headers, merged parameters)
//! - [`RequestId`] - UUID v7 request identifier
//! - [`ParamBag`] - Ordered string parameter map used for captures, query and body data
//! - [`HandlerError`] - Failure raised by middleware or handler code
//! - [`DispatchFailure`] - Request-time failures and their HTTP status mapping
//! - [`TokenStore`] and [`RecordSink`] - Narrow interfaces to external collaborators

#![doc(html_root_url = "https://docs.rs/switchyard-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod collaborators;
mod context;
mod error;
pub mod fixtures;
mod params;

pub use collaborators::{MemoryTokenStore, RecordError, RecordSink, TokenStore, TracingSink};
pub use context::{RequestContext, RequestId};
pub use error::{
    Diagnostics, DispatchFailure, ErrorDetail, ErrorEnvelope, FailureCategory, HandlerError,
    HandlerResult,
};
pub use params::ParamBag;
