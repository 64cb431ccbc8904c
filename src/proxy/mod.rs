//! Transport-facing interception pipeline.
//!
//! The transport (TLS-terminating proxy, test harness, CLI) hands raw
//! request and response bodies to an [`Interceptor`] and forwards whatever
//! comes back, using [`RewriteResult::content_length`] for the new
//! `Content-Length` header.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Interceptor                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  request ──> SchemaRegistry ──> locate ──> compress ──> body │
//! │                                                              │
//! │  response ─> SchemaRegistry ──> locate ──> pass / decompress │
//! │                                                              │
//! │                       ProxyStats (atomics)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stego::{Interceptor, StegoEngine};
//!
//! let interceptor = Interceptor::new(Arc::new(StegoEngine::new()));
//! let result = interceptor.on_request(url, body);
//! forward(result.body, result.content_length);
//! ```

mod interceptor;
mod stats;

pub use interceptor::{
    Direction, InterceptedMessage, Interceptor, Outcome, PassThroughReason, RewriteResult,
};
pub use stats::{MetricsSummary, ProxyStats};
