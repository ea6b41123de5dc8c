use axum::extract::Request;
use axum::routing::any;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tonic::Status;
use tracing::{debug, info, warn};

use crate::error::RouterError;
use crate::route::RouteBinding;
use crate::server::config::RpcHttpConfig;
use crate::server::handler::{
    CallContext, ErasedHandler, StreamingHandler, UnaryHandler, make_unary,
};

/// Collects one handler per planned route and mounts them on an `axum::Router`.
pub struct RpcHttpRouter {
    config: RpcHttpConfig,
    routes: Vec<(String, Arc<dyn ErasedHandler>)>,
    index: HashMap<String, usize>,
}

impl RpcHttpRouter {
    /// Create a new router. Handler failures go to `config.sink`.
    pub fn new(config: RpcHttpConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a unary handler for a route.
    ///
    /// # Example
    /// ```ignore
    /// router.unary("echo/say", "_EchoServer_Say_Handler", |ctx, request: EchoRequest| async move {
    ///     Ok(EchoReply { text: request.text })
    /// });
    /// ```
    pub fn unary<Req, Resp, F, Fut>(
        &mut self,
        route: impl Into<String>,
        handler_name: &str,
        call: F,
    ) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        let route = route.into();
        let handler = UnaryHandler::<Req, Resp>::new(
            &route,
            handler_name,
            make_unary(call),
            Arc::clone(&self.config.sink),
            self.config.max_body_bytes,
        );
        self.insert(route, Arc::new(handler));
        self
    }

    /// Register the rejecting handler of a streaming method.
    pub fn streaming(&mut self, route: impl Into<String>, handler_name: &str) -> &mut Self {
        let route = route.into();
        let handler = StreamingHandler::new(&route, handler_name, Arc::clone(&self.config.sink));
        self.insert(route, Arc::new(handler));
        self
    }

    /// Register a planned binding. Streaming methods get the rejecting handler
    /// and `call` is never used.
    pub fn bind<Req, Resp, F, Fut>(&mut self, binding: &RouteBinding, call: F) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        if binding.is_streaming() {
            self.streaming(binding.path.clone(), &binding.handler_name)
        } else {
            self.unary(binding.path.clone(), &binding.handler_name, call)
        }
    }

    fn insert(&mut self, route: String, handler: Arc<dyn ErasedHandler>) {
        match self.index.get(&route) {
            Some(&slot) => {
                warn!(
                    route = %route,
                    replaced = %self.routes[slot].1.name(),
                    handler = %handler.name(),
                    "Route registered twice, keeping the last handler"
                );
                self.routes[slot].1 = handler;
            }
            None => {
                info!(route = %route, handler = %handler.name(), "Registered RPC handler");
                self.index.insert(route.clone(), self.routes.len());
                self.routes.push((route, handler));
            }
        }
    }

    /// Check if a handler is registered for the given route.
    pub fn has_handler(&self, route: &str) -> bool {
        self.index.contains_key(route)
    }

    /// Name of the handler registered for the given route.
    pub fn handler_name(&self, route: &str) -> Option<&str> {
        self.index.get(route).map(|&slot| self.routes[slot].1.name())
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(route, _)| route.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Mount every route under the configured prefix and build the router.
    ///
    /// The prefix is prepended as is: `/api/` and `/custom/path` mount at
    /// `/api//custom/path`, while `/api/` and `echo/say` mount at
    /// `/api/echo/say`. Every HTTP method is accepted on a route. Routes that
    /// only differ in capture names match the same requests, so the last one
    /// registered wins. Routes that overlap in any other way, such as
    /// `/a/:x` and `/a/*`, fail with [`RouterError::InvalidPath`].
    pub fn into_router(self) -> Result<axum::Router, RouterError> {
        let mut mounted: Vec<(String, Arc<dyn ErasedHandler>)> = Vec::new();
        let mut by_shape: HashMap<String, usize> = HashMap::new();

        for (route, handler) in self.routes {
            let (path, shape) = router_path(&self.config.mount_path(&route))?;
            match by_shape.get(&shape) {
                Some(&slot) => {
                    warn!(
                        path = %path,
                        replaced = %mounted[slot].1.name(),
                        handler = %handler.name(),
                        "Routes overlap, keeping the last handler"
                    );
                    mounted[slot] = (path, handler);
                }
                None => {
                    by_shape.insert(shape, mounted.len());
                    mounted.push((path, handler));
                }
            }
        }

        // axum panics on conflicting routes; matchit reports the same conflicts.
        let mut matcher = matchit::Router::new();
        for (path, handler) in &mounted {
            if let Err(err) = matcher.insert(path.as_str(), ()) {
                warn!(
                    path = %path,
                    handler = %handler.name(),
                    error = %err,
                    "Route cannot be mounted"
                );
                return Err(RouterError::InvalidPath {
                    path: path.clone(),
                    reason: "conflicts with another route",
                });
            }
        }

        let mut router = axum::Router::new();
        for (path, handler) in mounted {
            debug!(path = %path, handler = %handler.name(), "Mounting route");
            router = router.route(
                &path,
                any(move |request: Request| Arc::clone(&handler).call(request)),
            );
        }

        Ok(router)
    }
}

/// Turn a mounted route into `axum` path syntax.
///
/// Adds the leading `/`, rewrites `:name` captures to `{name}` and a final `*`
/// to `{*rest}`. Also returns the route's shape, the path with capture names
/// erased, which identifies routes that match the same requests.
fn router_path(route: &str) -> Result<(String, String), RouterError> {
    let invalid = |reason| RouterError::InvalidPath {
        path: route.to_owned(),
        reason,
    };

    let trimmed = route.strip_prefix('/').unwrap_or(route);
    let segments: Vec<&str> = trimmed.split('/').collect();
    let last = segments.len() - 1;

    let mut path = String::with_capacity(route.len() + 1);
    let mut shape = String::with_capacity(route.len() + 1);
    let mut captures = HashSet::new();

    for (position, segment) in segments.iter().enumerate() {
        path.push('/');
        shape.push('/');

        let capture = if let Some(name) = segment.strip_prefix(':') {
            Some((name, false))
        } else if *segment == "*" {
            Some(("rest", true))
        } else if let Some(name) = segment.strip_prefix("{*").and_then(|s| s.strip_suffix('}')) {
            Some((name, true))
        } else if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some((name, false))
        } else {
            None
        };

        match capture {
            Some((name, wildcard)) => {
                if name.is_empty() || name.contains(['{', '}', '*', ':']) {
                    return Err(invalid("malformed capture"));
                }
                if wildcard && position != last {
                    return Err(invalid("wildcard must be the last segment"));
                }
                if !captures.insert(name) {
                    return Err(invalid("capture name used twice"));
                }
                if wildcard {
                    path.push_str(&format!("{{*{name}}}"));
                    shape.push_str("{*}");
                } else {
                    path.push_str(&format!("{{{name}}}"));
                    shape.push_str("{}");
                }
            }
            None => {
                if segment.contains(['{', '}']) {
                    return Err(invalid("unbalanced braces"));
                }
                if segment.starts_with('*') {
                    return Err(invalid("segment starts with '*'"));
                }
                path.push_str(segment);
                shape.push_str(segment);
            }
        }
    }

    Ok((path, shape))
}
