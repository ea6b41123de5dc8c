use axum::http::StatusCode;

/// A failed call to a generated handler, as reported to a [`DiagnosticSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler: String,
    pub route: String,
    pub status: StatusCode,
    pub message: String,
}

/// Receives one report per failed handler call.
///
/// Routers log through [`TracingSink`] unless another sink is set on
/// [`RpcHttpConfig::sink`](super::RpcHttpConfig).
pub trait DiagnosticSink: Send + Sync + 'static {
    fn handler_failed(&self, failure: &HandlerFailure);
}

/// Reports failures as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn handler_failed(&self, failure: &HandlerFailure) {
        tracing::warn!(
            handler = %failure.handler,
            route = %failure.route,
            status = failure.status.as_u16(),
            error = %failure.message,
            "RPC handler failed"
        );
    }
}
