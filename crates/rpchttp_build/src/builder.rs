use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use prost_build::ServiceGenerator;
use quote::quote;
use rpchttp_lite::{
    MethodDescriptor, MethodOptions, RouteBinding, RouteCollision, ServiceDescriptor,
    find_collisions, plan,
};

use crate::emit::{EmitContext, emit_service};
use crate::error::BuildError;
use crate::types::{ProstTypeNamer, RustPathNamer, TypeNamer};

/// Create a new generator builder with default settings.
pub fn configure() -> Builder {
    Builder::default()
}

/// Generated source for one protobuf package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// `{package}.rpchttp.rs`, or `_.rpchttp.rs` without a package.
    pub name: String,
    pub contents: String,
}

/// Configures HTTP router generation.
#[derive(Debug, Clone)]
pub struct Builder {
    runtime_crate: String,
    overrides: BTreeMap<String, String>,
    strict_routes: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            runtime_crate: "::rpchttp_lite".to_string(),
            overrides: BTreeMap::new(),
            strict_routes: false,
        }
    }
}

impl Builder {
    /// Path generated code uses to reach the runtime crate.
    pub fn runtime_crate(mut self, path: impl Into<String>) -> Self {
        self.runtime_crate = path.into();
        self
    }

    /// Serve a method on `path` instead of its default route.
    ///
    /// `method` is fully qualified, e.g. `echo.Echo.Say`. Takes precedence over
    /// an `http_path` option declared in the proto.
    pub fn route_override(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        let method = method.into();
        let method = method.strip_prefix('.').map(str::to_owned).unwrap_or(method);
        self.overrides.insert(method, path.into());
        self
    }

    /// Fail generation when two methods of a service share a route, instead of
    /// warning and letting the later method win.
    pub fn strict_routes(mut self, strict: bool) -> Self {
        self.strict_routes = strict;
        self
    }

    /// Generate routers for services read from a serialized `FileDescriptorSet`.
    pub fn compile_descriptor_set(&self, bytes: &[u8]) -> Result<Vec<GeneratedFile>, BuildError> {
        let services = rpchttp_lite::decode_file_descriptor_set(bytes)?;
        self.generate(&services)
    }

    /// Read a descriptor set from disk and write one file per package to `out_dir`.
    pub fn write_descriptor_set(
        &self,
        descriptor_set: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let bytes = std::fs::read(descriptor_set)?;
        let out_dir = out_dir.as_ref();

        let mut written = Vec::new();
        for file in self.compile_descriptor_set(&bytes)? {
            let path = out_dir.join(&file.name);
            std::fs::write(&path, file.contents)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Generate routers for services whose type references are fully qualified
    /// protobuf names.
    pub fn generate(&self, services: &[ServiceDescriptor]) -> Result<Vec<GeneratedFile>, BuildError> {
        let packages: Vec<String> = services.iter().map(|s| s.package.clone()).collect();
        let mut by_package: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for service in services {
            let namer = ProstTypeNamer::new(service.package.clone(), packages.iter().cloned());
            let tokens = self.emit(service, &namer)?;
            by_package
                .entry(service.package.as_str())
                .or_default()
                .push(tokens.to_string());
        }

        Ok(by_package
            .into_iter()
            .map(|(package, sources)| GeneratedFile {
                name: if package.is_empty() {
                    "_.rpchttp.rs".to_string()
                } else {
                    format!("{package}.rpchttp.rs")
                },
                contents: sources.join("\n"),
            })
            .collect())
    }

    /// Plan and emit the router of one service.
    pub fn emit(
        &self,
        service: &ServiceDescriptor,
        namer: &dyn TypeNamer,
    ) -> Result<TokenStream, BuildError> {
        let service = self.apply_overrides(service);
        let bindings = plan(&service);

        for collision in self.check_routes(&service, &bindings)? {
            println!(
                "cargo:warning=rpchttp: routes of '{}' collide on '{}', {} is shadowed by {}",
                service.full_name(),
                collision.path,
                collision.shadowed,
                collision.winner
            );
        }

        let runtime: TokenStream = self
            .runtime_crate
            .parse()
            .map_err(|_| BuildError::InvalidTypePath(self.runtime_crate.clone()))?;
        let ctx = EmitContext::new(&service, runtime, namer);
        emit_service(&service, &bindings, &ctx)
    }

    /// Collisions to warn about. In strict mode the first one is an error.
    fn check_routes(
        &self,
        service: &ServiceDescriptor,
        bindings: &[RouteBinding],
    ) -> Result<Vec<RouteCollision>, BuildError> {
        let mut collisions = find_collisions(bindings);
        if self.strict_routes && !collisions.is_empty() {
            let collision = collisions.swap_remove(0);
            return Err(BuildError::RouteCollision {
                service: service.full_name(),
                path: collision.path,
                shadowed: collision.shadowed,
                winner: collision.winner,
            });
        }
        Ok(collisions)
    }

    fn apply_overrides(&self, service: &ServiceDescriptor) -> ServiceDescriptor {
        let mut service = service.clone();
        let prefix = service.full_name();
        for method in &mut service.methods {
            if let Some(path) = self.overrides.get(&format!("{prefix}.{}", method.name)) {
                method.options = method.options.clone().with_http_path(path.clone());
            }
        }
        service
    }

    /// A `prost_build` service generator that appends router code after the
    /// output of `inner` (typically the `tonic` server generator).
    pub fn service_generator(
        self,
        inner: Option<Box<dyn ServiceGenerator>>,
    ) -> Box<dyn ServiceGenerator> {
        Box::new(HttpServiceGenerator {
            builder: self,
            inner,
        })
    }

    /// A `prost_build::Config` with this generator installed and JSON support
    /// on every message: `serde` derives, and `#[serde(default)]` so missing
    /// fields decode to their zero value.
    pub fn prost_config(self, inner: Option<Box<dyn ServiceGenerator>>) -> prost_build::Config {
        let mut config = prost_build::Config::new();
        config
            .service_generator(self.service_generator(inner))
            .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
            .message_attribute(".", "#[serde(default)]");
        config
    }
}

struct HttpServiceGenerator {
    builder: Builder,
    inner: Option<Box<dyn ServiceGenerator>>,
}

impl HttpServiceGenerator {
    fn descriptor(service: &prost_build::Service) -> ServiceDescriptor {
        ServiceDescriptor {
            package: service.package.clone(),
            name: service.proto_name.clone(),
            methods: service
                .methods
                .iter()
                .map(|method| MethodDescriptor {
                    name: method.proto_name.clone(),
                    input_type: method.input_type.clone(),
                    output_type: method.output_type.clone(),
                    client_streaming: method.client_streaming,
                    server_streaming: method.server_streaming,
                    options: MethodOptions::new(),
                })
                .collect(),
        }
    }
}

impl ServiceGenerator for HttpServiceGenerator {
    fn generate(&mut self, service: prost_build::Service, buf: &mut String) {
        let descriptor = Self::descriptor(&service);

        if let Some(inner) = self.inner.as_mut() {
            inner.generate(service, buf);
        }

        let output = match self.builder.emit(&descriptor, &RustPathNamer) {
            Ok(tokens) => tokens,
            Err(err) => {
                let message = format!("rpchttp: {err}");
                quote! { ::core::compile_error!(#message); }
            }
        };

        buf.push('\n');
        buf.push_str(&output.to_string());
    }

    fn finalize(&mut self, buf: &mut String) {
        if let Some(inner) = self.inner.as_mut() {
            inner.finalize(buf);
        }
    }

    fn finalize_package(&mut self, package: &str, buf: &mut String) {
        if let Some(inner) = self.inner.as_mut() {
            inner.finalize_package(package, buf);
        }
    }
}
