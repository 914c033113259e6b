use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Bad email, password or app, or an absent/expired/malformed token.
    /// Deliberately coarse so callers cannot tell which factor failed.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User already exists")]
    UserExists,
    #[error("User not found")]
    UserNotFound,
    #[error("App not found")]
    AppNotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Operation timed out")]
    Timeout,
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::InvalidCredentials => {
                tracing::debug!("Invalid credentials");
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            Self::UserExists => {
                tracing::debug!("User already exists");
                (StatusCode::CONFLICT, "User already exists".to_string())
            }
            Self::UserNotFound => {
                tracing::debug!("User not found");
                (StatusCode::NOT_FOUND, "User not found".to_string())
            }
            Self::AppNotFound => {
                tracing::debug!("App not found");
                (StatusCode::NOT_FOUND, "App not found".to_string())
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                (StatusCode::CONFLICT, msg)
            }
            Self::Timeout => {
                tracing::warn!("Store operation timed out");
                (StatusCode::GATEWAY_TIMEOUT, "Timed out".to_string())
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Returns true when the error is a PostgreSQL unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
