use std::time::Duration;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use duckgen_core::{HttpError, INTERNAL_SERVER_ERROR_MESSAGE};
use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Image generation errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Missing or invalid request fields
    #[error("{0}")]
    Validation(String),

    /// Provider answered with a non-success status
    #[error("provider API error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    /// Provider answered successfully with a body we cannot use
    #[error("unexpected response format from {provider}: {detail}")]
    UpstreamFormat { provider: &'static str, detail: String },

    /// Provider did not answer within the configured timeout
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider could not be reached
    #[error("upstream connection failed: {0}")]
    Connection(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for ImageGenError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Connection(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamFormat { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Upstream { message, .. } => message.clone(),
            Self::Timeout(_) => "Upstream request timed out".to_owned(),
            Self::Connection(_) => "Upstream request failed".to_owned(),
            Self::UpstreamFormat { .. } | Self::Internal(_) => INTERNAL_SERVER_ERROR_MESSAGE.to_owned(),
        }
    }
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if matches!(self, Self::UpstreamFormat { .. } | Self::Internal(_)) {
            tracing::error!(error = %self, "image generation failed");
        }

        (status, Json(self.error_body())).into_response()
    }
}
