//! Unified error handling for the directory and its HTTP surface.
//!
//! Provides a single error type that every directory operation returns and
//! that converts directly into Axum HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // Uniqueness
    #[error("That email is already registered")]
    DuplicateEmail,

    #[error("That username and discriminator are already taken")]
    DuplicateHandle,

    #[error("Too many users have this username")]
    HandleExhausted,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Backends
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::DuplicateHandle => "DUPLICATE_HANDLE",
            AppError::HandleExhausted => "HANDLE_EXHAUSTED",
            AppError::NotFound => "NOT_FOUND",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail | AppError::DuplicateHandle | AppError::HandleExhausted => {
                StatusCode::CONFLICT
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageUnavailable(_) | AppError::CacheUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),

            AppError::StorageUnavailable(detail) => {
                tracing::error!("Storage unavailable: {}", detail);
                "The directory is temporarily unavailable".to_string()
            }
            AppError::CacheUnavailable(detail) => {
                tracing::error!("Cache unavailable: {}", detail);
                "The directory cache is temporarily unavailable".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::Password(msg) => AppError::Validation(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        AppError::StorageUnavailable(detail.into())
    }

    pub fn cache(detail: impl Into<String>) -> Self {
        AppError::CacheUnavailable(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::DuplicateHandle.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::HandleExhausted.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::bad_request("x").code(), "BAD_REQUEST");
        assert_eq!(
            AppError::storage("timeout").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::storage("connection refused to 10.0.0.4");
        assert!(!err.user_message().contains("10.0.0.4"));
        assert_eq!(AppError::internal("stack").user_message(), "An internal error occurred");
        assert_eq!(AppError::validation("bad email").user_message(), "bad email");
    }

    #[test]
    fn test_domain_errors_become_validation() {
        let err: AppError = DomainError::password("too short").into();
        assert_eq!(err, AppError::Validation("too short".to_string()));
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AppError::DuplicateHandle.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "DUPLICATE_HANDLE");
        assert!(json["error"]["message"].is_string());
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        assert_eq!(missing.ok_or_not_found(), Err(AppError::NotFound));
        assert_eq!(Some(3).ok_or_not_found(), Ok(3));
    }
}
