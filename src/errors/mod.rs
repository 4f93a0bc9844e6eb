//! Error handling module for the lectern backend.
//!
//! Every failure a handler can produce is an [`AppError`]. Its `IntoResponse`
//! impl is the one place that decides status codes and the error envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::validator::FieldErrors;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const EDIT_CONFLICT: &str = "EDIT_CONFLICT";
    pub const INVALID_AUTHENTICATION_TOKEN: &str = "INVALID_AUTHENTICATION_TOKEN";
    pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const ACTIVATION_REQUIRED: &str = "ACTIVATION_REQUIRED";
    pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Message sent in place of server-side failure details.
const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound,
    /// One message per offending field
    Validation(FieldErrors),
    /// Conditional update matched no row at the expected version
    EditConflict,
    /// Bearer token malformed, unknown or expired
    AuthenticationFailed,
    /// Anonymous request hit a route that needs an account
    AuthenticationRequired,
    /// Wrong e-mail/password pair at login
    InvalidCredentials,
    /// Account exists but has not been activated
    ActivationRequired,
    /// Client exhausted its token bucket
    RateLimitExceeded,
    /// Store failure or store deadline exceeded
    Database(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(key: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.to_string(), message.to_string());
        AppError::Validation(errors)
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EditConflict => StatusCode::CONFLICT,
            AppError::AuthenticationFailed
            | AppError::AuthenticationRequired
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::ActivationRequired => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::EditConflict => codes::EDIT_CONFLICT,
            AppError::AuthenticationFailed => codes::INVALID_AUTHENTICATION_TOKEN,
            AppError::AuthenticationRequired => codes::AUTHENTICATION_REQUIRED,
            AppError::InvalidCredentials => codes::INVALID_CREDENTIALS,
            AppError::ActivationRequired => codes::ACTIVATION_REQUIRED,
            AppError::RateLimitExceeded => codes::RATE_LIMIT_EXCEEDED,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Client-facing message. Server-side causes are never echoed.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound => "the requested resource could not be found".to_string(),
            AppError::Validation(_) => "the request failed validation".to_string(),
            AppError::EditConflict => {
                "unable to update the record due to an edit conflict, please try again".to_string()
            }
            AppError::AuthenticationFailed => {
                "invalid or missing authentication token".to_string()
            }
            AppError::AuthenticationRequired => {
                "you must be authenticated to access this resource".to_string()
            }
            AppError::InvalidCredentials => "invalid authentication credentials".to_string(),
            AppError::ActivationRequired => {
                "your user account must be activated to access this resource".to_string()
            }
            AppError::RateLimitExceeded => "rate limit exceeded".to_string(),
            AppError::Database(_) | AppError::Internal(_) => SERVER_ERROR_MESSAGE.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Database(cause) | AppError::Internal(cause) => {
                write!(f, "{}: {}", self.error_code(), cause)
            }
            _ => write!(f, "{}: {}", self.error_code(), self.message()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Database("Database error: operation timed out".to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation(fields) => serde_json::to_value(fields).ok(),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(cause) | AppError::Internal(cause) => {
                tracing::error!(code = self.error_code(), "{}", cause);
            }
            _ => tracing::debug!("request rejected: {}", self),
        }

        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        let mut response = (status, Json(body)).into_response();

        if matches!(self, AppError::AuthenticationFailed) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::field("title", "must be provided").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::EditConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::AuthenticationFailed.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::ActivationRequired.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_and_conflict_are_distinct() {
        assert_ne!(
            AppError::NotFound.error_code(),
            AppError::EditConflict.error_code()
        );
        assert_ne!(
            AppError::NotFound.status_code(),
            AppError::EditConflict.status_code()
        );
    }

    #[test]
    fn test_validation_envelope_lists_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("title".into(), "must be provided".into());
        fields.insert("runtime".into(), "must be a positive integer".into());

        let body = ErrorResponse::new(&AppError::Validation(fields));
        let details = body.error.details.unwrap();
        assert_eq!(details["title"], "must be provided");
        assert_eq!(details["runtime"], "must be a positive integer");
        assert!(!body.success);
    }

    #[test]
    fn test_server_errors_hide_cause() {
        let err = AppError::Database("no such table: secrets".into());
        assert!(!err.message().contains("secrets"));
        assert!(err.to_string().contains("secrets"));
    }

    #[test]
    fn test_authentication_failure_sets_challenge_header() {
        let response = AppError::AuthenticationFailed.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
