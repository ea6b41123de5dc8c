//! Server-side types for rpchttp_lite.
//!
//! This module contains the `RpcHttpRouter` and the per-method adapters that
//! bridge HTTP requests to typed service calls.

mod config;
mod diagnostics;
mod handler;
mod router;

pub use config::RpcHttpConfig;
pub use diagnostics::{DiagnosticSink, HandlerFailure, TracingSink};
pub use handler::{CallContext, UnaryFn, make_unary};
pub use router::RpcHttpRouter;
