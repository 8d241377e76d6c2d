//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::{ApplicationWriteError, StoreError, WriteStage};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation Errors**: Missing login fields, out-of-range application values
/// - **Authentication Errors**: Wrong credentials, unknown session, bad admin key
/// - **Store Errors**: Database unreachable or a query failed
/// - **Write Errors**: A loan submission statement failed
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A login field was left blank. No store access is attempted.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Complete all fields to sign in")]
    MissingFields,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// No customer matches the submitted credentials.
    ///
    /// Returns HTTP 401 Unauthorized. The same answer is given when the store
    /// could not be reached during login.
    #[error("Invalid credentials. Check your details")]
    InvalidCredentials,

    /// Bearer token is missing or does not belong to an open session.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Your session has expired. Please sign in again")]
    InvalidSession,

    /// Administrative key is missing or wrong, or no key is configured.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid administrative key")]
    InvalidAdminKey,

    /// A store read failed.
    ///
    /// Returns HTTP 503 when the store is unreachable, 500 otherwise.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A loan submission write failed.
    ///
    /// Returns HTTP 500 with a code naming the failed statement.
    #[error("Write error: {0}")]
    Write(#[from] ApplicationWriteError),
}

/// A body that is not JSON, or does not match the expected shape, is a
/// validation failure like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `MissingFields`, `InvalidRequest` → 400 Bad Request
/// - `InvalidCredentials`, `InvalidSession`, `InvalidAdminKey` → 401 Unauthorized
/// - `Store(Unavailable)` → 503 Service Unavailable
/// - `Store(Query)`, `Write` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::MissingFields => (StatusCode::BAD_REQUEST, "missing_fields", self.to_string()),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, "invalid_session", self.to_string())
            }
            AppError::InvalidAdminKey => {
                (StatusCode::UNAUTHORIZED, "invalid_admin_key", self.to_string())
            }
            AppError::Store(StoreError::Unavailable(ref detail)) => {
                tracing::error!(%detail, "Store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "The bank's database cannot be reached right now. Please try again later."
                        .to_string(),
                )
            }
            AppError::Store(StoreError::Query(ref detail)) => {
                tracing::error!(%detail, "Store query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Write(ref err) => {
                tracing::error!(stage = %err.stage, error = %err.source, "Loan submission write failed");
                let (code, message) = match err.stage {
                    WriteStage::Loan => ("loan_write_failed", "The loan application could not be saved"),
                    WriteStage::Evaluation => (
                        "evaluation_write_failed",
                        "The loan evaluation could not be saved",
                    ),
                    WriteStage::Status => (
                        "status_write_failed",
                        "The loan status could not be updated",
                    ),
                    WriteStage::Commit => (
                        "application_write_failed",
                        "The loan application could not be saved",
                    ),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, message.to_string())
            }
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
