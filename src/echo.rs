//! The `echo` package: messages, the server trait and the HTTP router, laid out
//! the way `prost`, `tonic` and `rpchttp_build` generate them for
//! `proto/echo.proto`.

use rpchttp_lite::{MethodDescriptor, MethodOptions, ServiceDescriptor};

#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EchoRequest {
    #[prost(string, tag = "1")]
    pub text: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EchoReply {
    #[prost(string, tag = "1")]
    pub text: ::prost::alloc::string::String,
}

pub mod echo_server {
    #[tonic::async_trait]
    pub trait Echo: std::marker::Send + std::marker::Sync + 'static {
        async fn say(
            &self,
            request: tonic::Request<super::EchoRequest>,
        ) -> std::result::Result<tonic::Response<super::EchoReply>, tonic::Status>;

        async fn shout(
            &self,
            request: tonic::Request<super::EchoRequest>,
        ) -> std::result::Result<tonic::Response<super::EchoReply>, tonic::Status>;

        type SubscribeStream: futures::Stream<
                Item = std::result::Result<super::EchoReply, tonic::Status>,
            > + std::marker::Send
            + 'static;

        async fn subscribe(
            &self,
            request: tonic::Request<super::EchoRequest>,
        ) -> std::result::Result<tonic::Response<Self::SubscribeStream>, tonic::Status>;
    }
}

/// Descriptor of `echo.Echo` as declared in `proto/echo.proto`.
pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new("Echo")
        .with_package("echo")
        .with_method(MethodDescriptor::unary(
            "Say",
            ".echo.EchoRequest",
            ".echo.EchoReply",
        ))
        .with_method(
            MethodDescriptor::unary("Shout", ".echo.EchoRequest", ".echo.EchoReply")
                .with_options(MethodOptions::from_legacy_blob(r#"10000:"/Custom/Path""#)),
        )
        .with_method(
            MethodDescriptor::unary("Subscribe", ".echo.EchoRequest", ".echo.EchoReply")
                .with_server_streaming(true),
        )
}

/// HTTP/JSON router for `echo.Echo`.
///
/// Routes:
/// - `echo/say` -> `Say`
/// - `/custom/path` -> `Shout`
/// - `echo/subscribe` -> `Subscribe` (streaming, always 501)
#[allow(dead_code, unused_variables)]
pub fn echo_router_with_config<T>(
    service: T,
    config: ::rpchttp_lite::RpcHttpConfig,
) -> ::core::result::Result<::rpchttp_lite::axum::Router, ::rpchttp_lite::RouterError>
where
    T: echo_server::Echo + Send + Sync + 'static,
{
    let service = ::std::sync::Arc::new(service);
    let mut router = ::rpchttp_lite::RpcHttpRouter::new(config);
    router.unary("echo/say", "_EchoServer_Say_Handler", {
        let service = ::std::sync::Arc::clone(&service);
        move |ctx: ::rpchttp_lite::CallContext, input: EchoRequest| {
            let service = ::std::sync::Arc::clone(&service);
            async move {
                <T as echo_server::Echo>::say(&service, ctx.into_request(input))
                    .await
                    .map(::rpchttp_lite::tonic::Response::into_inner)
            }
        }
    });
    router.unary("/custom/path", "_EchoServer_Shout_Handler", {
        let service = ::std::sync::Arc::clone(&service);
        move |ctx: ::rpchttp_lite::CallContext, input: EchoRequest| {
            let service = ::std::sync::Arc::clone(&service);
            async move {
                <T as echo_server::Echo>::shout(&service, ctx.into_request(input))
                    .await
                    .map(::rpchttp_lite::tonic::Response::into_inner)
            }
        }
    });
    router.streaming("echo/subscribe", "_EchoServer_Subscribe_Handler");
    router.into_router()
}

/// HTTP/JSON router for `echo.Echo`.
#[allow(dead_code)]
pub fn new_echo_router<T>(
    service: T,
    prefix: &str,
) -> ::core::result::Result<::rpchttp_lite::axum::Router, ::rpchttp_lite::RouterError>
where
    T: echo_server::Echo + Send + Sync + 'static,
{
    echo_router_with_config(service, ::rpchttp_lite::RpcHttpConfig::with_prefix(prefix))
}
