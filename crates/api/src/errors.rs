use attic_storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::{ErrorDetail, ErrorResponse};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            ApiError::Storage(err) => match err {
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StorageError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                StorageError::StorageUnavailable(..) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
                StorageError::SigningFailed(..) => (StatusCode::BAD_GATEWAY, "SIGNING_FAILED"),
                StorageError::Unsupported(..) => (StatusCode::NOT_IMPLEMENTED, "UNSUPPORTED"),
                StorageError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            ApiError::NotFound => "Resource not found".to_string(),
            // Keep filesystem paths out of responses
            ApiError::IoError(_) => "Failed to read stored file".to_string(),
            ApiError::Storage(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
