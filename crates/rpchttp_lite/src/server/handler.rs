use axum::body::{self, Body};
use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tonic::Status;

use crate::error::CallError;
use crate::server::diagnostics::{DiagnosticSink, HandlerFailure};

/// A type-erased handler that can be stored in the router's registry.
///
/// This trait allows us to keep unary handlers with different request and
/// response types next to streaming rejections.
pub(crate) trait ErasedHandler: Send + Sync {
    /// Generated name of the handler, e.g. `_EchoServer_Say_Handler`.
    fn name(&self) -> &str;

    /// Serve one HTTP request. Always produces a response.
    fn call(self: Arc<Self>, request: Request) -> BoxFuture<'static, Response>;
}

/// The context a service method is invoked with.
///
/// It is a background context: nothing from the HTTP layer cancels the call,
/// and there is never a deadline.
#[derive(Debug, Clone)]
pub struct CallContext {
    route: Arc<str>,
    handler: Arc<str>,
}

impl CallContext {
    pub(crate) fn background(route: Arc<str>, handler: Arc<str>) -> Self {
        Self { route, handler }
    }

    /// The route the request was dispatched on, as planned.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn deadline(&self) -> Option<Instant> {
        None
    }

    /// Wrap a decoded message in a `tonic::Request`, the shape `tonic` service
    /// traits take. The context travels along as a request extension.
    pub fn into_request<T>(self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.extensions_mut().insert(self);
        request
    }
}

/// A boxed call into a typed service method.
pub type UnaryFn<Req, Resp> = Arc<
    dyn Fn(CallContext, Req) -> BoxFuture<'static, Result<Resp, Status>> + Send + Sync + 'static,
>;

/// Helper to create a boxed unary call from an async closure.
pub fn make_unary<Req, Resp, F, Fut>(f: F) -> UnaryFn<Req, Resp>
where
    F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
{
    Arc::new(move |ctx, request| Box::pin(f(ctx, request)))
}

/// Bridges an HTTP request into a typed unary call:
/// read body, decode JSON, invoke, encode JSON.
pub(crate) struct UnaryHandler<Req, Resp> {
    route: Arc<str>,
    name: Arc<str>,
    call: UnaryFn<Req, Resp>,
    sink: Arc<dyn DiagnosticSink>,
    max_body_bytes: usize,
}

impl<Req, Resp> UnaryHandler<Req, Resp>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    pub fn new(
        route: &str,
        name: &str,
        call: UnaryFn<Req, Resp>,
        sink: Arc<dyn DiagnosticSink>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            route: route.into(),
            name: name.into(),
            call,
            sink,
            max_body_bytes,
        }
    }

    async fn invoke(&self, request: Request) -> Result<Vec<u8>, CallError> {
        // The body is consumed here, so it is released whichever way we return.
        let content = body::to_bytes(request.into_body(), self.max_body_bytes)
            .await
            .map_err(CallError::BodyRead)?;

        let input: Req = serde_json::from_slice(&content).map_err(CallError::Decode)?;

        tracing::debug!(
            handler = %self.name,
            route = %self.route,
            "Dispatching RPC call"
        );

        let ctx = CallContext::background(Arc::clone(&self.route), Arc::clone(&self.name));
        let output = (self.call)(ctx, input).await?;

        serde_json::to_vec(&output).map_err(CallError::Encode)
    }
}

impl<Req, Resp> ErasedHandler for UnaryHandler<Req, Resp>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(self: Arc<Self>, request: Request) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            match self.invoke(request).await {
                // No explicit status: the default 200 applies.
                Ok(encoded) => Response::new(Body::from(encoded)),
                Err(err) => reject(self.sink.as_ref(), &self.route, &self.name, err),
            }
        })
    }
}

/// Answers every call to a streaming method with 501.
pub(crate) struct StreamingHandler {
    route: Arc<str>,
    name: Arc<str>,
    sink: Arc<dyn DiagnosticSink>,
}

impl StreamingHandler {
    pub fn new(route: &str, name: &str, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            route: route.into(),
            name: name.into(),
            sink,
        }
    }
}

impl ErasedHandler for StreamingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(self: Arc<Self>, request: Request) -> BoxFuture<'static, Response> {
        drop(request);
        let response = reject(
            self.sink.as_ref(),
            &self.route,
            &self.name,
            CallError::StreamingUnsupported,
        );
        Box::pin(std::future::ready(response))
    }
}

/// Report a failed call and turn it into a plain-text error response.
fn reject(sink: &dyn DiagnosticSink, route: &str, handler: &str, err: CallError) -> Response {
    let status = err.status_code();
    let message = err.to_string();

    sink.handler_failed(&HandlerFailure {
        handler: handler.to_owned(),
        route: route.to_owned(),
        status,
        message: message.clone(),
    });

    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}
