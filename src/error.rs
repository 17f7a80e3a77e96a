use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

use crate::services::excel::IngestError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Wrong file type: {0}")]
    WrongFileType(String),
    #[error("File too large: {0}")]
    FileTooLarge(String),
    #[error("Could not read file: {0}")]
    UnparsableFile(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "BAD_REQUEST",
            AppError::WrongFileType(_) => "WRONG_TYPE",
            AppError::FileTooLarge(_) => "LIMIT_FILE_SIZE",
            AppError::UnparsableFile(_) => "UNPARSABLE_FILE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => "SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::WrongFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnparsableFile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnparsableFile(msg) => AppError::UnparsableFile(msg),
            IngestError::Io(err) => AppError::Io(err),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        // Server-side details stay in the log.
        let message = match &self {
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                "An error occurred while processing the request".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "code": self.code(),
            "error": message
        }));

        (status, body).into_response()
    }
}
