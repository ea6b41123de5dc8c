//! Rust names for protobuf types, services and methods, following the
//! conventions of `prost` and `tonic` generated code.

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Ident, Span};
use quote::format_ident;

/// Maps a protobuf type reference to the Rust type path used in generated code.
pub trait TypeNamer {
    fn rust_type(&self, proto_type: &str) -> String;
}

/// Type references are already Rust paths, as `prost_build` hands them to
/// service generators.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustPathNamer;

impl TypeNamer for RustPathNamer {
    fn rust_type(&self, proto_type: &str) -> String {
        proto_type.to_owned()
    }
}

/// Resolves fully qualified protobuf names (`.pkg.Outer.Inner`) to the module
/// layout `prost` generates, relative to the package being generated.
#[derive(Debug, Clone)]
pub struct ProstTypeNamer {
    package: String,
    known_packages: Vec<String>,
}

impl ProstTypeNamer {
    /// `known_packages` disambiguates package segments from nested messages.
    pub fn new(package: impl Into<String>, known_packages: impl IntoIterator<Item = String>) -> Self {
        let package = package.into();
        let mut known_packages: Vec<String> = known_packages.into_iter().collect();
        known_packages.push(package.clone());
        // Longest first, so `a.b` wins over `a` for `.a.b.C`.
        known_packages.sort_by_key(|p| std::cmp::Reverse(p.len()));
        known_packages.dedup();
        Self {
            package,
            known_packages,
        }
    }

    fn split_package<'a>(&self, full_name: &'a str) -> (&'a str, &'a str) {
        for package in &self.known_packages {
            if package.is_empty() {
                continue;
            }
            if let Some(rest) = full_name
                .strip_prefix(package.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
            {
                return (&full_name[..package.len()], rest);
            }
        }

        if self.known_packages.iter().any(String::is_empty) && !full_name.contains('.') {
            return ("", full_name);
        }

        full_name.rsplit_once('.').unwrap_or(("", full_name))
    }
}

impl TypeNamer for ProstTypeNamer {
    fn rust_type(&self, proto_type: &str) -> String {
        let full_name = proto_type.strip_prefix('.').unwrap_or(proto_type);

        if let Some(well_known) = full_name.strip_prefix("google.protobuf.") {
            return match well_known {
                "Empty" => "()".to_owned(),
                other => format!("::prost_types::{other}"),
            };
        }

        let (package, relative) = self.split_package(full_name);

        let current: Vec<&str> = split_segments(&self.package);
        let target: Vec<&str> = split_segments(package);
        let common = current
            .iter()
            .zip(&target)
            .take_while(|(a, b)| a == b)
            .count();

        let mut path: Vec<String> = vec!["super".to_owned(); current.len() - common];
        path.extend(target[common..].iter().map(|segment| segment.to_snake_case()));

        let mut nested: Vec<&str> = relative.split('.').collect();
        let name = nested.pop().unwrap_or(relative);
        path.extend(nested.iter().map(|message| message.to_snake_case()));
        path.push(name.to_upper_camel_case());

        path.join("::")
    }
}

fn split_segments(package: &str) -> Vec<&str> {
    package.split('.').filter(|s| !s.is_empty()).collect()
}

/// Trait implemented by the service, e.g. `Echo`.
pub fn service_trait_ident(service: &str) -> Ident {
    format_ident!("{}", service.to_upper_camel_case())
}

/// Module `tonic` puts the server trait in, e.g. `echo_server`.
pub fn server_module_ident(service: &str) -> Ident {
    format_ident!("{}_server", service.to_upper_camel_case().to_snake_case())
}

/// Trait method of an RPC, snake-cased. Keywords become raw identifiers,
/// except the ones that cannot be raw, which get a trailing underscore.
pub fn method_ident(method: &str) -> Ident {
    let name = method.to_snake_case();
    match name.as_str() {
        "self" | "super" | "extern" | "crate" => format_ident!("{}_", name),
        _ if is_keyword(&name) => Ident::new_raw(&name, Span::call_site()),
        _ => format_ident!("{}", name),
    }
}

/// Name of a function derived from the service, e.g. `echo_router_with_config`.
pub fn service_fn_ident(prefix: &str, service: &str, suffix: &str) -> Ident {
    let snake = service.to_upper_camel_case().to_snake_case();
    format_ident!("{}{}{}", prefix, snake, suffix)
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "abstract"
            | "as"
            | "async"
            | "await"
            | "become"
            | "box"
            | "break"
            | "const"
            | "continue"
            | "do"
            | "dyn"
            | "else"
            | "enum"
            | "false"
            | "final"
            | "fn"
            | "for"
            | "gen"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "macro"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "override"
            | "priv"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "trait"
            | "true"
            | "try"
            | "type"
            | "typeof"
            | "unsafe"
            | "unsized"
            | "use"
            | "virtual"
            | "where"
            | "while"
            | "yield"
    )
}
