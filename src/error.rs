use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{db::StoreError, models::DataValidationError};

/// Errors surfaced by the HTTP layer
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(#[from] DataValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn recommendation_not_found(id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("Recommendation with id '{}' was not found.", id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        tracing::error!(status = status.as_u16(), error = %message, "Request failed");

        let body = Json(json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
