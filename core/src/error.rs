//! Error types for the athenahealth client.
//!
//! # Design
//! Usage errors (`InvalidUsage`, `Unsupported`) are raised before any request
//! is built, so a caller can tell "nothing was sent" apart from failures that
//! happened on the wire. `Remote` carries a business error that the API
//! reports inside an otherwise successful 200 response.

use thiserror::Error;

/// Errors returned by `AthenaClient` build/parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required argument was missing or empty. No request was sent.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// The requested variant of an operation is not implemented.
    #[error("not supported: {0}")]
    Unsupported(String),

    /// The response did not have the documented shape, or its success flag
    /// reported a failure.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The API returned an error message embedded in a 200 response.
    #[error("{0}")]
    Remote(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connect, TLS, IO).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// A request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::DeserializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_embedded_message_verbatim() {
        let err = ApiError::Remote("Patient already exists".to_string());
        assert_eq!(err.to_string(), "Patient already exists");
    }

    #[test]
    fn http_error_includes_status_and_body() {
        let err = ApiError::HttpError {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401: unauthorized");
    }
}
