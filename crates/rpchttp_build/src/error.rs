use rpchttp_lite::DescriptorError;
use thiserror::Error;

/// Errors that can occur while generating HTTP routers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// The descriptor set could not be read.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Reading a descriptor set or writing generated code failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Two methods of a service were planned onto the same route.
    #[error("routes of '{service}' collide on '{path}': {shadowed} is shadowed by {winner}")]
    RouteCollision {
        service: String,
        path: String,
        shadowed: String,
        winner: String,
    },

    /// A type reference does not resolve to a Rust type path.
    #[error("'{0}' is not a valid Rust type path")]
    InvalidTypePath(String),
}
