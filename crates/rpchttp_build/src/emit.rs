//! Emits the router source for one service.

use proc_macro2::{Ident, TokenStream};
use quote::quote;
use rpchttp_lite::{RouteBinding, ServiceDescriptor};

use crate::error::BuildError;
use crate::types::{
    TypeNamer, method_ident, server_module_ident, service_fn_ident, service_trait_ident,
};

/// What every handler registration of one service refers to.
pub struct EmitContext<'a> {
    /// Path of the runtime crate, e.g. `::rpchttp_lite`.
    pub runtime: TokenStream,
    pub namer: &'a dyn TypeNamer,
    server_module: Ident,
    service_trait: Ident,
}

impl<'a> EmitContext<'a> {
    pub fn new(service: &ServiceDescriptor, runtime: TokenStream, namer: &'a dyn TypeNamer) -> Self {
        Self {
            runtime,
            namer,
            server_module: server_module_ident(&service.name),
            service_trait: service_trait_ident(&service.name),
        }
    }

    fn type_path(&self, proto_type: &str) -> Result<TokenStream, BuildError> {
        let rust_type = self.namer.rust_type(proto_type);
        rust_type
            .parse()
            .map_err(|_| BuildError::InvalidTypePath(rust_type))
    }
}

/// Emit the registration of one method's handler on `router`.
///
/// Unary methods decode into the input type and call the service trait
/// through a background context. Streaming methods get the rejecting handler.
pub fn emit_handler(binding: &RouteBinding, ctx: &EmitContext<'_>) -> Result<TokenStream, BuildError> {
    let path = &binding.path;
    let handler_name = &binding.handler_name;
    let runtime = &ctx.runtime;

    if binding.is_streaming() {
        return Ok(quote! {
            router.streaming(#path, #handler_name);
        });
    }

    let input_type = ctx.type_path(&binding.method.input_type)?;
    let server_module = &ctx.server_module;
    let service_trait = &ctx.service_trait;
    let method = method_ident(&binding.method.name);

    Ok(quote! {
        router.unary(#path, #handler_name, {
            let service = ::std::sync::Arc::clone(&service);
            move |ctx: #runtime::CallContext, input: #input_type| {
                let service = ::std::sync::Arc::clone(&service);
                async move {
                    <T as #server_module::#service_trait>::#method(&service, ctx.into_request(input))
                        .await
                        .map(#runtime::tonic::Response::into_inner)
                }
            }
        });
    })
}

/// Emit the router constructors of a service.
///
/// `new_{service}_router(service, prefix)` builds the router with default
/// settings; `{service}_router_with_config(service, config)` takes a full
/// configuration.
pub fn emit_service(
    service: &ServiceDescriptor,
    bindings: &[RouteBinding],
    ctx: &EmitContext<'_>,
) -> Result<TokenStream, BuildError> {
    let runtime = &ctx.runtime;
    let server_module = &ctx.server_module;
    let service_trait = &ctx.service_trait;
    let with_config = service_fn_ident("", &service.name, "_router_with_config");
    let with_prefix = service_fn_ident("new_", &service.name, "_router");

    let registrations = bindings
        .iter()
        .map(|binding| emit_handler(binding, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = format!("HTTP/JSON router for `{}`.", service.full_name());
    let routes = bindings.iter().map(|binding| {
        let mode = if binding.is_streaming() {
            " (streaming, always 501)"
        } else {
            ""
        };
        format!("- `{}` -> `{}`{}", binding.path, binding.method.name, mode)
    });

    Ok(quote! {
        #[doc = #summary]
        #[doc = ""]
        #[doc = "Routes:"]
        #(#[doc = #routes])*
        #[allow(dead_code, unused_variables)]
        pub fn #with_config<T>(
            service: T,
            config: #runtime::RpcHttpConfig,
        ) -> ::core::result::Result<#runtime::axum::Router, #runtime::RouterError>
        where
            T: #server_module::#service_trait + Send + Sync + 'static,
        {
            let service = ::std::sync::Arc::new(service);
            let mut router = #runtime::RpcHttpRouter::new(config);
            #(#registrations)*
            router.into_router()
        }

        #[doc = #summary]
        #[allow(dead_code)]
        pub fn #with_prefix<T>(
            service: T,
            prefix: &str,
        ) -> ::core::result::Result<#runtime::axum::Router, #runtime::RouterError>
        where
            T: #server_module::#service_trait + Send + Sync + 'static,
        {
            #with_config(service, #runtime::RpcHttpConfig::with_prefix(prefix))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProstTypeNamer;
    use rpchttp_lite::{MethodDescriptor, plan};

    fn echo() -> ServiceDescriptor {
        ServiceDescriptor::new("Echo")
            .with_package("echo")
            .with_method(MethodDescriptor::unary(
                "Say",
                ".echo.EchoRequest",
                ".echo.EchoReply",
            ))
            .with_method(
                MethodDescriptor::unary("Subscribe", ".echo.EchoRequest", ".echo.EchoReply")
                    .with_server_streaming(true),
            )
    }

    fn flat(tokens: TokenStream) -> String {
        tokens.to_string().split_whitespace().collect()
    }

    #[test]
    fn test_unary_handler_calls_service_trait() {
        let service = echo();
        let namer = ProstTypeNamer::new("echo", []);
        let ctx = EmitContext::new(&service, quote!(::rpchttp_lite), &namer);
        let bindings = plan(&service);

        let code = flat(emit_handler(&bindings[0], &ctx).unwrap());
        assert!(code.contains(r#"router.unary("echo/say","_EchoServer_Say_Handler""#), "{code}");
        assert!(code.contains("input:EchoRequest"), "{code}");
        assert!(code.contains("<Tasecho_server::Echo>::say(&service,ctx.into_request(input))"), "{code}");
    }

    #[test]
    fn test_streaming_handler_never_calls_service() {
        let service = echo();
        let namer = ProstTypeNamer::new("echo", []);
        let ctx = EmitContext::new(&service, quote!(::rpchttp_lite), &namer);
        let bindings = plan(&service);

        let code = flat(emit_handler(&bindings[1], &ctx).unwrap());
        assert_eq!(
            code,
            r#"router.streaming("echo/subscribe","_EchoServer_Subscribe_Handler");"#
        );
    }

    #[test]
    fn test_service_constructors() {
        let service = echo();
        let namer = ProstTypeNamer::new("echo", []);
        let ctx = EmitContext::new(&service, quote!(::rpchttp_lite), &namer);

        let code = flat(emit_service(&service, &plan(&service), &ctx).unwrap());
        assert!(code.contains("pubfnecho_router_with_config<T>"), "{code}");
        assert!(code.contains("pubfnnew_echo_router<T>(service:T,prefix:&str)"), "{code}");
        assert!(code.contains("T:echo_server::Echo+Send+Sync+'static"), "{code}");
        assert!(code.contains("router.into_router()"), "{code}");
    }

    #[test]
    fn test_invalid_type_path_is_reported() {
        struct Broken;
        impl TypeNamer for Broken {
            fn rust_type(&self, _proto_type: &str) -> String {
                "Echo(Request".to_owned()
            }
        }

        let service = echo();
        let ctx = EmitContext::new(&service, quote!(::rpchttp_lite), &Broken);
        let result = emit_handler(&plan(&service)[0], &ctx);
        assert!(matches!(result, Err(BuildError::InvalidTypePath(_))));
    }
}
