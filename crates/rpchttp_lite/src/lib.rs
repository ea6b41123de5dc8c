//! HTTP/JSON bindings for RPC services.
//!
//! A service descriptor is planned into routes (`{service}/{Method}`, or the
//! method's `http_path` option), and every route gets an adapter: unary
//! methods read a JSON body, call the typed service and answer with JSON;
//! streaming methods always answer `501 Not Implemented`.
//!
//! # Example
//!
//! ```ignore
//! use rpchttp_lite::server::{RpcHttpConfig, RpcHttpRouter};
//!
//! let mut router = RpcHttpRouter::new(RpcHttpConfig::with_prefix("/api/"));
//! router.unary("echo/say", "_EchoServer_Say_Handler", |_ctx, request: EchoRequest| async move {
//!     Ok(EchoReply { text: request.text })
//! });
//! router.streaming("echo/subscribe", "_EchoServer_Subscribe_Handler");
//!
//! let app: axum::Router = router.into_router()?;
//! ```
//!
//! Routers for whole services are normally generated by `rpchttp_build`.

pub mod descriptor;
pub mod error;
pub mod naming;
pub mod route;
pub mod server;

pub use descriptor::{
    HTTP_PATH_OPTION, MethodDescriptor, MethodOptions, ServiceDescriptor,
    decode_file_descriptor_set,
};
pub use error::{CallError, DescriptorError, RouterError};
pub use route::{RouteBinding, RouteCollision, find_collisions, plan};
pub use server::{CallContext, DiagnosticSink, HandlerFailure, RpcHttpConfig, RpcHttpRouter};

// Generated code names these through the runtime crate.
pub use axum;
pub use tonic;
