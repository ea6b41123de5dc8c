pub mod echo;
pub mod service;

pub use service::EchoService;

/// Address the demo server listens on unless `ECHO_ADDR` is set.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
