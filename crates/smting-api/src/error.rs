use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use smting_core::CoreError;
use smting_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("insufficient balance")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Logged server-side; the client only sees a generic retryable message.
    #[error("{0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InsufficientBalance { balance, required } => {
                ApiError::InsufficientBalance { balance, required }
            }
            CoreError::InvalidInput(v) => ApiError::BadRequest(v.to_string()),
            e @ (CoreError::ProfileNotFound(_) | CoreError::NotFound { .. }) => {
                ApiError::NotFound(e.to_string())
            }
            e @ CoreError::AlreadyExists { .. } => ApiError::Conflict(e.to_string()),
            e @ (CoreError::TransactionPersistence(_) | CoreError::Store(_)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InsufficientBalance { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                ErrorResponse {
                    error: "insufficient balance".to_string(),
                    balance: Some(balance),
                    required: Some(required),
                },
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, plain(msg)),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, plain(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, plain(msg)),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, plain("unauthorized".into())),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    plain("temporary failure, please retry".into()),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn plain(error: String) -> ErrorResponse {
    ErrorResponse {
        error,
        balance: None,
        required: None,
    }
}
