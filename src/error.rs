//! Error types for examdesk
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` and renders `{ "error": message }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Each variant maps to one HTTP status code. Messages of server-side
/// failures are logged but never sent to the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but not allowed (403)
    #[error("Access denied")]
    Forbidden,

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request conflicts with existing state, e.g. duplicate e-mail (400)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment signature did not match (400)
    #[error("Invalid payment signature")]
    InvalidSignature,

    /// Too many attempts (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Supabase Storage error (502)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Razorpay returned an error (502)
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Status code, client-facing message and metric label for this error
    fn parts(&self) -> (StatusCode, String, &'static str) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), "not_found"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string(), "forbidden"),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "conflict"),
            AppError::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                "invalid_signature",
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                self.to_string(),
                "rate_limited",
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "database",
            ),
            AppError::Storage(_) => (
                StatusCode::BAD_GATEWAY,
                "Storage service unavailable".to_string(),
                "storage",
            ),
            AppError::PaymentGateway(_) => (
                StatusCode::BAD_GATEWAY,
                "Payment gateway unavailable".to_string(),
                "payment_gateway",
            ),
            AppError::HttpClient(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream request failed".to_string(),
                "http_client",
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server misconfigured".to_string(),
                "config",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
        } else {
            tracing::debug!(error = %self, error_type, "Request rejected");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Map a unique-constraint violation to `AppError::Conflict`
///
/// Any other database error is passed through unchanged.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
