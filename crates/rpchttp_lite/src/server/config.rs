use std::fmt;
use std::sync::Arc;

use bon::Builder;

use crate::server::diagnostics::{DiagnosticSink, TracingSink};

/// Configuration for an [`RpcHttpRouter`](super::RpcHttpRouter).
#[derive(Clone, Builder)]
pub struct RpcHttpConfig {
    /// Prepended to every planned route when it is mounted, e.g. `/api/`.
    #[builder(into, default)]
    pub prefix: String,

    /// Largest request body a unary handler reads. Larger bodies fail the read.
    #[builder(default = usize::MAX)]
    pub max_body_bytes: usize,

    /// Receives one report per failed call. Logs through `tracing` by default.
    #[builder(default = default_sink())]
    pub sink: Arc<dyn DiagnosticSink>,
}

fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}

impl fmt::Debug for RpcHttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcHttpConfig")
            .field("prefix", &self.prefix)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for RpcHttpConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RpcHttpConfig {
    /// A config that only sets the route prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::builder().prefix(prefix).build()
    }

    /// The path a planned route is mounted at, before router normalization.
    pub(crate) fn mount_path(&self, route: &str) -> String {
        format!("{}{}", self.prefix, route)
    }
}
