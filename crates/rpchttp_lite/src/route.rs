//! Route planning: which HTTP path each method of a service is served on.

use std::collections::HashMap;

use crate::descriptor::{MethodDescriptor, ServiceDescriptor};
use crate::naming::{default_route, handler_name};

/// The association between an HTTP path and the generated handler of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    pub path: String,
    pub handler_name: String,
    pub method: MethodDescriptor,
}

impl RouteBinding {
    /// Streaming methods are bound to a handler that rejects every call.
    pub fn is_streaming(&self) -> bool {
        !self.method.is_unary()
    }
}

/// Plan one binding per method, in declaration order.
///
/// The route is `{service}/{Method}` unless the method carries an HTTP path
/// override, which then replaces it verbatim. Either way the route is
/// lower-cased. Paths are not validated or de-duplicated here.
pub fn plan(service: &ServiceDescriptor) -> Vec<RouteBinding> {
    service
        .methods
        .iter()
        .map(|method| {
            let path = match method.options.http_path() {
                Some(path) => path.to_owned(),
                None => default_route(&service.name, &method.name),
            };

            RouteBinding {
                path: path.to_lowercase(),
                handler_name: handler_name(&service.name, &method.name),
                method: method.clone(),
            }
        })
        .collect()
}

/// Two methods planned onto the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCollision {
    pub path: String,
    /// Handler registered first, which the router ends up replacing.
    pub shadowed: String,
    pub winner: String,
}

/// Find planned paths bound more than once.
///
/// Routers built from these bindings keep the last registration for a path.
pub fn find_collisions(bindings: &[RouteBinding]) -> Vec<RouteCollision> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut collisions = Vec::new();

    for binding in bindings {
        if let Some(previous) = seen.insert(&binding.path, &binding.handler_name) {
            collisions.push(RouteCollision {
                path: binding.path.clone(),
                shadowed: previous.to_owned(),
                winner: binding.handler_name.clone(),
            });
        }
    }

    collisions
}
