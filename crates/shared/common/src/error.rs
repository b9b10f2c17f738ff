//! Unified error handling.
//!
//! Provides a single error type for the auth core that a route layer can
//! turn straight into an Axum HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication
    #[error("User already exists")]
    DuplicateUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    // Infrastructure
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Validation
    #[error("{0}")]
    Validation(String),

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
            AppError::DuplicateUser => "DUPLICATE_USER",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::NotFound => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),

            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::CacheUnavailable(detail) => {
                tracing::error!("Cache unavailable: {}", detail);
                "Authentication is temporarily unavailable".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }

    /// Whether this error means a token or credential was rejected,
    /// as opposed to an infrastructure failure.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::DuplicateUser
        )
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
// Backend Error Conversion
// =============================================================================

/// Decoding failures (bad signature, expiry, malformed claims) all reject
/// the token. Signing failures are mapped to `Internal` at the call site.
#[cfg(feature = "jwt")]
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("Token rejected: {}", err);
        AppError::InvalidToken
    }
}

#[cfg(feature = "cache")]
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", err);
        AppError::CacheUnavailable(err.to_string())
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
            DomainError::Token(_) => AppError::InvalidToken,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
    fn ok_or_invalid_token(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }

    fn ok_or_invalid_token(self) -> AppResult<T> {
        self.ok_or(AppError::InvalidToken)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn cache_unavailable(detail: impl Into<String>) -> Self {
        AppError::CacheUnavailable(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::DuplicateUser.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_cache_unavailable_hides_detail() {
        let err = AppError::cache_unavailable("connection refused 10.0.0.3:6379");
        assert_eq!(err.code(), "CACHE_UNAVAILABLE");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.user_message().contains("10.0.0.3"));
        assert!(!err.is_auth_rejection());
    }

    #[test]
    fn test_domain_errors_convert() {
        assert!(matches!(
            AppError::from(DomainError::password("too short")),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(DomainError::token("bad scope")),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<u8> = None;
        assert!(matches!(none.ok_or_invalid_token(), Err(AppError::InvalidToken)));
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = AppError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
