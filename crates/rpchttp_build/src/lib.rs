//! Code generation for `rpchttp_lite` routers.
//!
//! Turns RPC service descriptors into functions that build an
//! [`axum::Router`](rpchttp_lite::axum::Router) with one JSON endpoint per
//! method. Use it from a build script, either on a serialized descriptor set:
//!
//! ```no_run
//! let out_dir = std::env::var("OUT_DIR").unwrap();
//! rpchttp_build::configure()
//!     .route_override("echo.Echo.Say", "/say")
//!     .write_descriptor_set("echo.bin", out_dir)
//!     .unwrap();
//! ```
//!
//! or as a `prost_build` service generator, chained after the `tonic` one,
//! through [`Builder::service_generator`] or [`Builder::prost_config`].

mod builder;
mod emit;
mod error;
mod types;

pub use builder::{Builder, GeneratedFile, configure};
pub use emit::{EmitContext, emit_handler, emit_service};
pub use error::BuildError;
pub use types::{ProstTypeNamer, RustPathNamer, TypeNamer};
