//! Naming rules shared by the route planner and the code generator.

use heck::ToUpperCamelCase;

/// Upper camel case, the casing `prost` and `tonic` give service traits.
pub fn camel_case(raw: &str) -> String {
    raw.to_upper_camel_case()
}

/// The conventional route for a method before any override is applied:
/// `{service}/{Method}` with the service lower-cased and the method verbatim.
pub fn default_route(service: &str, method: &str) -> String {
    format!("{}/{}", camel_case(service).to_lowercase(), method)
}

/// Name of the adapter generated for one method, e.g. `_EchoServer_Say_Handler`.
pub fn handler_name(service: &str, method: &str) -> String {
    format!(
        "_{}Server_{}_Handler",
        camel_case(service),
        camel_case(method)
    )
}
