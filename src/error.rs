use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ModelError;

/// The primary error type for request handling.
///
/// Client errors carry a short reason for the logs only; every response body
/// is the bare status reason so no internal detail reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input the handler cannot work with.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Missing or mismatching anti-forgery token on an unsafe request.
    #[error("CSRF token missing or invalid")]
    InvalidCsrfToken,
    /// Missing record or an id that cannot name one.
    #[error("Not found")]
    NotFound,
    /// Store, template or other backend failure.
    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidCsrfToken => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Plain-text response with the canonical reason phrase as body.
pub fn status_response(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or("Error")).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(error_id = %error_id, "Internal error: {:?}", e);
            }
            AppError::BadRequest(reason) => tracing::debug!("Bad request: {}", reason),
            AppError::InvalidCsrfToken | AppError::NotFound => {}
        }
        status_response(status)
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NoRecord => AppError::NotFound,
            other => AppError::Internal(other.into()),
        }
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;
