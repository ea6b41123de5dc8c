use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur while reading service descriptors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescriptorError {
    /// The serialized descriptor set could not be decoded.
    #[error("failed to decode descriptor set")]
    Decode(#[from] prost::DecodeError),

    /// A service in the descriptor set has no name.
    #[error("service without a name in '{file}'")]
    MissingServiceName { file: String },

    /// A method in the descriptor set has no name.
    #[error("method without a name in service '{service}'")]
    MissingMethodName { service: String },
}

/// Errors that can occur while mounting planned routes on the HTTP router.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouterError {
    /// The route cannot be expressed as an HTTP router path.
    #[error("invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

/// Errors that end a single HTTP call to a generated handler.
///
/// The `Display` text of each variant is exactly what is written back as the
/// response body.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CallError {
    /// Reading the request body failed.
    #[error("{0}")]
    BodyRead(#[source] axum::Error),

    /// The request body is not valid JSON for the input type.
    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    /// The service implementation returned an error.
    #[error("{}", .0.message())]
    Service(tonic::Status),

    /// The service output could not be encoded as JSON.
    #[error("{0}")]
    Encode(#[source] serde_json::Error),

    /// The method streams in at least one direction.
    #[error("Streaming functions over http are not supported")]
    StreamingUnsupported,
}

impl CallError {
    pub const STATUS_BODY_READ: StatusCode = StatusCode::REQUEST_TIMEOUT;
    pub const STATUS_DECODE: StatusCode = StatusCode::BAD_REQUEST;
    pub const STATUS_SERVICE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;
    pub const STATUS_STREAMING: StatusCode = StatusCode::NOT_IMPLEMENTED;

    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CallError::BodyRead(_) => Self::STATUS_BODY_READ,
            CallError::Decode(_) => Self::STATUS_DECODE,
            CallError::Service(_) | CallError::Encode(_) => Self::STATUS_SERVICE,
            CallError::StreamingUnsupported => Self::STATUS_STREAMING,
        }
    }
}

impl From<tonic::Status> for CallError {
    fn from(status: tonic::Status) -> Self {
        CallError::Service(status)
    }
}
