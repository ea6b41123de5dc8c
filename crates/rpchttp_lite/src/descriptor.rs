//! Service descriptors consumed by the route planner and the code generator.

use std::collections::BTreeMap;

use prost::Message;

use crate::error::DescriptorError;

/// Method option key under which an HTTP route override is stored.
///
/// Protos declare it as an extension of `google.protobuf.MethodOptions`:
/// `extend google.protobuf.MethodOptions { string http_path = 10000; }`
pub const HTTP_PATH_OPTION: u32 = 10000;

/// An RPC service: its name, protobuf package and methods in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub package: String,
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            package: String::new(),
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Fully qualified name: `{package}.{name}`, or just the name without a package.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Build from a `prost_types` descriptor.
    ///
    /// `prost_types::MethodOptions` does not keep extension fields, so methods
    /// built this way never carry an HTTP path override.
    pub fn from_proto(package: &str, proto: &prost_types::ServiceDescriptorProto) -> Self {
        Self {
            package: package.to_owned(),
            name: proto.name().to_owned(),
            methods: proto
                .method
                .iter()
                .map(|method| MethodDescriptor {
                    name: method.name().to_owned(),
                    input_type: method.input_type().to_owned(),
                    output_type: method.output_type().to_owned(),
                    client_streaming: method.client_streaming(),
                    server_streaming: method.server_streaming(),
                    options: MethodOptions::default(),
                })
                .collect(),
        }
    }
}

/// One RPC method.
///
/// `input_type` and `output_type` are opaque references, usually fully
/// qualified protobuf names such as `.echo.EchoRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub options: MethodOptions,
}

impl MethodDescriptor {
    pub fn unary(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            client_streaming: false,
            server_streaming: false,
            options: MethodOptions::default(),
        }
    }

    pub fn with_client_streaming(mut self, streaming: bool) -> Self {
        self.client_streaming = streaming;
        self
    }

    pub fn with_server_streaming(mut self, streaming: bool) -> Self {
        self.server_streaming = streaming;
        self
    }

    pub fn with_options(mut self, options: MethodOptions) -> Self {
        self.options = options;
        self
    }

    /// Neither side streams.
    pub fn is_unary(&self) -> bool {
        !self.client_streaming && !self.server_streaming
    }
}

/// Method-level metadata keyed by option field number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodOptions {
    entries: BTreeMap<u32, String>,
}

impl MethodOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: u32, value: impl Into<String>) -> Self {
        self.entries.insert(key, value.into());
        self
    }

    pub fn with_http_path(self, path: impl Into<String>) -> Self {
        self.with(HTTP_PATH_OPTION, path)
    }

    pub fn get(&self, key: u32) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    /// The route override, if the method declares one.
    pub fn http_path(&self) -> Option<&str> {
        self.get(HTTP_PATH_OPTION)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the text rendering of a single string option, e.g. `10000:"/custom/path"`.
    ///
    /// The blob is split on `"`; it is only recognised when that yields exactly
    /// three parts and the first one is `{key}:`, with `key` written in plain
    /// decimal (no sign, no leading zero). Anything else gives empty options,
    /// so the method keeps its default route.
    pub fn from_legacy_blob(blob: &str) -> Self {
        let parts: Vec<&str> = blob.split('"').collect();
        if parts.len() != 3 {
            return Self::default();
        }

        match parts[0].strip_suffix(':').and_then(parse_option_key) {
            Some(key) => Self::default().with(key, parts[1]),
            None => Self::default(),
        }
    }
}

fn parse_option_key(key: &str) -> Option<u32> {
    if key.is_empty() || key.starts_with('0') || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Decode a serialized `google.protobuf.FileDescriptorSet`, as written by
/// `protoc --descriptor_set_out`, into service descriptors.
pub fn decode_file_descriptor_set(bytes: &[u8]) -> Result<Vec<ServiceDescriptor>, DescriptorError> {
    let set = RawFileDescriptorSet::decode(bytes)?;
    let mut services = Vec::new();

    for file in set.file {
        let package = file.package.unwrap_or_default();
        let file_name = file.name.unwrap_or_default();

        for service in file.service {
            let name = service
                .name
                .filter(|name| !name.is_empty())
                .ok_or_else(|| DescriptorError::MissingServiceName {
                    file: file_name.clone(),
                })?;

            let mut methods = Vec::with_capacity(service.method.len());
            for method in service.method {
                let method_name = method
                    .name
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| DescriptorError::MissingMethodName {
                        service: name.clone(),
                    })?;

                let options = match method.options.and_then(|options| options.http_path) {
                    Some(path) => MethodOptions::new().with_http_path(path),
                    None => MethodOptions::new(),
                };

                methods.push(MethodDescriptor {
                    name: method_name,
                    input_type: method.input_type.unwrap_or_default(),
                    output_type: method.output_type.unwrap_or_default(),
                    client_streaming: method.client_streaming.unwrap_or(false),
                    server_streaming: method.server_streaming.unwrap_or(false),
                    options,
                });
            }

            services.push(ServiceDescriptor {
                package: package.clone(),
                name,
                methods,
            });
        }
    }

    Ok(services)
}

// Subsets of descriptor.proto. Unlike `prost_types`, `RawMethodOptions`
// keeps the HTTP path extension field.

#[derive(Clone, PartialEq, Message)]
struct RawFileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    file: Vec<RawFileDescriptor>,
}

#[derive(Clone, PartialEq, Message)]
struct RawFileDescriptor {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(string, optional, tag = "2")]
    package: Option<String>,
    #[prost(message, repeated, tag = "6")]
    service: Vec<RawServiceDescriptor>,
}

#[derive(Clone, PartialEq, Message)]
struct RawServiceDescriptor {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    method: Vec<RawMethodDescriptor>,
}

#[derive(Clone, PartialEq, Message)]
struct RawMethodDescriptor {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(string, optional, tag = "2")]
    input_type: Option<String>,
    #[prost(string, optional, tag = "3")]
    output_type: Option<String>,
    #[prost(message, optional, tag = "4")]
    options: Option<RawMethodOptions>,
    #[prost(bool, optional, tag = "5")]
    client_streaming: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    server_streaming: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
struct RawMethodOptions {
    #[prost(string, optional, tag = "10000")]
    http_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_set(options: Option<RawMethodOptions>) -> Vec<u8> {
        RawFileDescriptorSet {
            file: vec![RawFileDescriptor {
                name: Some("echo.proto".to_string()),
                package: Some("echo".to_string()),
                service: vec![RawServiceDescriptor {
                    name: Some("Echo".to_string()),
                    method: vec![
                        RawMethodDescriptor {
                            name: Some("Say".to_string()),
                            input_type: Some(".echo.EchoRequest".to_string()),
                            output_type: Some(".echo.EchoReply".to_string()),
                            options,
                            client_streaming: None,
                            server_streaming: None,
                        },
                        RawMethodDescriptor {
                            name: Some("Stream".to_string()),
                            input_type: Some(".echo.EchoRequest".to_string()),
                            output_type: Some(".echo.EchoReply".to_string()),
                            options: None,
                            client_streaming: None,
                            server_streaming: Some(true),
                        },
                    ],
                }],
            }],
        }
        .encode_to_vec()
    }

    #[test]
    fn test_legacy_blob_override() {
        let options = MethodOptions::from_legacy_blob(r#"10000:"/custom/path""#);
        assert_eq!(options.http_path(), Some("/custom/path"));
    }

    #[test]
    fn test_legacy_blob_ignored_when_malformed() {
        for blob in [
            "",
            "10000:/custom/path",
            r#"10000:"/a" "/b""#,
            r#"9999:"/custom/path""#,
            r#"10000 :"/custom/path""#,
            r#"x:"/custom/path""#,
            r#"010000:"/x""#,
            r#"+10000:"/x""#,
            r#":"/x""#,
        ] {
            assert_eq!(MethodOptions::from_legacy_blob(blob).http_path(), None, "{blob}");
        }
    }

    #[test]
    fn test_legacy_blob_other_key_is_kept_but_not_a_path() {
        let options = MethodOptions::from_legacy_blob(r#"20000:"value""#);
        assert_eq!(options.get(20000), Some("value"));
        assert_eq!(options.http_path(), None);
    }

    #[test]
    fn test_decode_keeps_http_path_extension() {
        let bytes = encoded_set(Some(RawMethodOptions {
            http_path: Some("/custom/path".to_string()),
        }));
        let services = decode_file_descriptor_set(&bytes).unwrap();

        assert_eq!(services.len(), 1);
        let echo = &services[0];
        assert_eq!(echo.full_name(), "echo.Echo");
        assert_eq!(echo.methods[0].options.http_path(), Some("/custom/path"));
        assert!(echo.methods[0].is_unary());
        assert!(!echo.methods[1].is_unary());
        assert_eq!(echo.methods[1].input_type, ".echo.EchoRequest");
    }

    #[test]
    fn test_decode_reads_prost_types_encoding() {
        let set = prost_types::FileDescriptorSet {
            file: vec![prost_types::FileDescriptorProto {
                name: Some("echo.proto".to_string()),
                package: Some("echo".to_string()),
                service: vec![prost_types::ServiceDescriptorProto {
                    name: Some("Echo".to_string()),
                    method: vec![prost_types::MethodDescriptorProto {
                        name: Some("Say".to_string()),
                        input_type: Some(".echo.EchoRequest".to_string()),
                        output_type: Some(".echo.EchoReply".to_string()),
                        client_streaming: Some(true),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };

        let services = decode_file_descriptor_set(&set.encode_to_vec()).unwrap();
        assert_eq!(services[0].methods[0].name, "Say");
        assert!(services[0].methods[0].client_streaming);
        assert!(services[0].methods[0].options.is_empty());
    }

    #[test]
    fn test_decode_rejects_unnamed_service() {
        let set = RawFileDescriptorSet {
            file: vec![RawFileDescriptor {
                name: Some("broken.proto".to_string()),
                package: None,
                service: vec![RawServiceDescriptor {
                    name: None,
                    method: vec![],
                }],
            }],
        };

        let result = decode_file_descriptor_set(&set.encode_to_vec());
        assert!(matches!(
            result,
            Err(DescriptorError::MissingServiceName { .. })
        ));
    }

    #[test]
    fn test_from_proto() {
        let proto = prost_types::ServiceDescriptorProto {
            name: Some("Echo".to_string()),
            method: vec![prost_types::MethodDescriptorProto {
                name: Some("Say".to_string()),
                input_type: Some(".echo.EchoRequest".to_string()),
                output_type: Some(".echo.EchoReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let service = ServiceDescriptor::from_proto("echo", &proto);
        assert_eq!(service.full_name(), "echo.Echo");
        assert!(service.methods[0].is_unary());
    }
}
