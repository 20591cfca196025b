//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side faults to
//! Sentry before responding to the client. Route handlers return
//! `Result<T, AppError>`; form-level validation failures are handled in the
//! handlers themselves by re-rendering the submitting form.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::accounts::AccountError;
use crate::services::uploads::UploadError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account lifecycle operation failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Multipart form parsing or upload storage failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this is a server-side fault worth reporting.
    fn is_server_fault(&self) -> bool {
        match self {
            Self::Internal(_) | Self::Upload(UploadError::Io(_)) => true,
            Self::Database(e) => matches!(
                e,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Account(e) => matches!(
                e,
                AccountError::Repository(_)
                    | AccountError::PasswordHash
                    | AccountError::Notification(_)
            ),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(e) => match e {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Account(e) => match e {
                AccountError::InvalidEmail(_)
                | AccountError::WeakPassword(_)
                | AccountError::PasswordMismatch => StatusCode::BAD_REQUEST,
                AccountError::EmailTaken => StatusCode::CONFLICT,
                AccountError::EmailNotFound | AccountError::TokenNotFound => StatusCode::NOT_FOUND,
                AccountError::NotActivated | AccountError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                AccountError::Notification(_) => StatusCode::BAD_GATEWAY,
                AccountError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(e) => match e {
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(e) => match e {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(_) => "Conflict".to_string(),
                _ => "Internal server error".to_string(),
            },
            Self::Account(e) => match e {
                AccountError::EmailTaken => {
                    "An account with this email already exists".to_string()
                }
                AccountError::EmailNotFound | AccountError::TokenNotFound => {
                    // Same message for consumed tokens and tokens that never
                    // existed.
                    "Not found".to_string()
                }
                AccountError::NotActivated => "Account is not activated".to_string(),
                AccountError::InvalidCredentials => "Invalid credentials".to_string(),
                AccountError::InvalidEmail(_) => "Invalid email address".to_string(),
                AccountError::WeakPassword(msg) => msg.clone(),
                AccountError::PasswordMismatch => "The passwords do not match".to_string(),
                AccountError::Notification(_) => "Failed to send email".to_string(),
                AccountError::Repository(RepositoryError::NotFound) => "Not found".to_string(),
                _ => "Internal server error".to_string(),
            },
            Self::Upload(e) => match e {
                UploadError::Io(_) => "Internal server error".to_string(),
                UploadError::MissingField(field) => format!("Missing form field: {field}"),
                UploadError::Multipart(_) => "Malformed form submission".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_account_error_status_codes() {
        assert_eq!(
            get_status(AppError::Account(AccountError::EmailTaken)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Account(AccountError::TokenNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Account(AccountError::EmailNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Account(AccountError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Account(AccountError::NotActivated)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_repository_error_status_codes() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "email".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_not_found_message_is_generic() {
        // "already confirmed" must not be distinguishable from "never existed"
        let response = AppError::Account(AccountError::TokenNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
