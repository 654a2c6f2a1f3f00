use axum::{
    Json,
    response::{IntoResponse, Response},
};
use duckgen_core::{HttpError, INTERNAL_SERVER_ERROR_MESSAGE};
use duckgen_storage::StorageError;
use http::StatusCode;
use thiserror::Error;

/// Errors from serving stored images
#[derive(Debug, Error)]
pub enum FeedError {
    /// No object under the key, or no store configured
    #[error("image not found: {0}")]
    NotFound(String),

    /// Store failed to answer
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl HttpError for FeedError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Image not found".to_owned(),
            Self::Storage(_) => INTERNAL_SERVER_ERROR_MESSAGE.to_owned(),
        }
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        if let Self::Storage(e) = &self {
            tracing::error!(error = %e, "failed to read stored image");
        }

        (self.status_code(), Json(self.error_body())).into_response()
    }
}
