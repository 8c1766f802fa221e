//! Service error types and their wire mapping.
//!
//! Every component signals failure through [`ServiceError`]; the mapping to
//! an HTTP status and a client-safe body happens exactly once, in the
//! `IntoResponse` impl. Internal detail is logged there and never leaks into
//! the response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorBody;

/// Typed failure taxonomy for the request path.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input. Caller-correctable; the message is
    /// safe to return verbatim.
    #[error("{0}")]
    Validation(String),

    /// The remote image URL answered with a non-success status.
    #[error("image not found at {0}")]
    ImageNotFound(String),

    /// The image could not be fetched or written to scratch storage.
    #[error("image download failed: {0}")]
    Download(String),

    /// Decoding or running inference on the downloaded image failed.
    #[error("feature extraction failed: {0}")]
    Extraction(String),

    /// The vector index rejected or failed an operation.
    #[error("index operation failed: {0}")]
    Index(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::ImageNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Download(_) => StatusCode::BAD_REQUEST,
            ServiceError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller. Validation messages pass through;
    /// everything else is generic.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Validation(msg) => msg.clone(),
            ServiceError::ImageNotFound(_) => "Image Not Found".to_string(),
            ServiceError::Download(_) => "Failed to Download Image".to_string(),
            ServiceError::Extraction(_) => "Failed to Search Data".to_string(),
            ServiceError::Index(_) => "Vector Index Operation Failed".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION",
            ServiceError::ImageNotFound(_) => "IMAGE_NOT_FOUND",
            ServiceError::Download(_) => "DOWNLOAD_FAILED",
            ServiceError::Extraction(_) => "EXTRACTION_FAILED",
            ServiceError::Index(_) => "INDEX_FAILED",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        error!(code = self.code(), "request failed: {}", self);

        let body = ErrorBody {
            error: self.public_message(),
            code: Some(self.code().to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}
