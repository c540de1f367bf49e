//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across all backend modules. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx)
//!    - [`Auth`](AppError::Auth) → 401 Unauthorized (missing/invalid credential)
//!    - [`InvalidInput`](AppError::InvalidInput) → 400 Bad Request (empty prompt,
//!      malformed submission)
//!    - [`Forbidden`](AppError::Forbidden) → 403 Forbidden (e.g. deleting a
//!      message you did not author)
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found
//!
//! 2. **Server Errors** (5xx)
//!    - [`Proxy`](AppError::Proxy) → 502 Bad Gateway (generation backend
//!      unreachable, timed out, or erroring)
//!    - [`Store`](AppError::Store) → 500 Internal Server Error (persistence failure)
//!    - [`Config`](AppError::Config) / [`Internal`](AppError::Internal) → 500
//!
//! ## Propagation policy
//!
//! Auth and validation errors are local and terminal for the triggering request.
//! Proxy errors are recovered into a visible bot chat message by the session
//! layer, never propagated as a connection-level failure. Store errors are
//! logged and reported to the submitting connection without killing the session.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type covering all error scenarios.
///
/// Each variant includes a descriptive `String` for context. The `#[error]` attribute
/// from `thiserror` provides automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or invalid credential presented at connection time.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid user input validation error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The bound identity is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generation backend unreachable, timed out, or returned a transport error.
    #[error("Proxy error: {0}")]
    Proxy(String),

    /// Message store persistence failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal server error (unexpected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Proxy(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For internal errors, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg) => msg.clone(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Proxy(_) => "Generation backend unavailable".to_string(),
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        // Full error for server logs, sanitized message for the client
        if status.is_server_error() {
            tracing::error!("Server error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let error_code = match self {
            AppError::Config(_) => "Config",
            AppError::Auth(_) => "Auth",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Proxy(_) => "Proxy",
            AppError::Store(_) => "Store",
            AppError::Internal(_) => "Internal",
        };

        let body = Json(json!({
            "error": message,
            "code": error_code,
        }));

        (status, body).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Store(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Store(format!("Database error: {}", err)),
        }
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON error: {}", err))
    }
}
