use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error kind as exposed on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Auth(_) | AppError::Forbidden(_) => "AuthError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::ValidationError(_) => "ValidationError",
            AppError::Conflict(_) => "ConflictError",
            AppError::Storage(_) => "StorageError",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::Conflict(msg)
            | AppError::Storage(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self.message());
        } else {
            tracing::warn!("Request rejected: {}: {}", status, self.message());
        }

        let body = Json(json!({
            "kind": self.kind(),
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}
