use http::StatusCode;
use serde::Serialize;

/// Message returned for every failure whose detail must stay server-side
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type, keeping domain errors
/// decoupled from the response framing.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// JSON body sent to the client
    fn error_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.client_message(),
        }
    }
}

/// `{"error": "..."}` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }

    pub fn internal() -> Self {
        Self::new(INTERNAL_SERVER_ERROR_MESSAGE)
    }
}
