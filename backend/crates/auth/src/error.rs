//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, field::FieldErrors, kind::ErrorKind};
use kernel::pagination::InvalidPage;
use platform::mail::MailError;
use thiserror::Error;

use crate::domain::policy::Denied;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message for every failed code exchange
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired confirmation code.";

pub const USERNAME_TAKEN_MESSAGE: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN_MESSAGE: &str = "A user with that email already exists.";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-level input errors
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Wrong, consumed, never issued or expired confirmation code
    #[error("Invalid confirmation code")]
    InvalidConfirmationCode,

    /// Anonymous request to a protected resource
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// Bearer token rejected
    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    /// Authenticated, but not allowed
    #[error("Permission denied")]
    PermissionDenied,

    /// Page past the end
    #[error("Invalid page")]
    InvalidPage(#[from] InvalidPage),

    /// Mail delivery failed
    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),

    /// Token could not be signed
    #[error("Token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn username_taken() -> Self {
        AuthError::Validation(FieldErrors::single("username", USERNAME_TAKEN_MESSAGE))
    }

    pub fn email_taken() -> Self {
        AuthError::Validation(FieldErrors::single("email", EMAIL_TAKEN_MESSAGE))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::InvalidConfirmationCode => ErrorKind::BadRequest,
            AuthError::UserNotFound | AuthError::InvalidPage(_) => ErrorKind::NotFound,
            AuthError::Unauthenticated | AuthError::InvalidToken(_) => ErrorKind::Unauthorized,
            AuthError::PermissionDenied => ErrorKind::Forbidden,
            AuthError::Mail(_)
            | AuthError::Token(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Internal details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Validation(fields) => AppError::validation(fields.clone()),
            AuthError::InvalidConfirmationCode => AppError::validation(FieldErrors::single(
                "confirmation_code",
                INVALID_CODE_MESSAGE,
            )),
            AuthError::UserNotFound => AppError::not_found("User not found"),
            AuthError::InvalidPage(e) => AppError::not_found(e.to_string()),
            AuthError::Unauthenticated => AppError::unauthorized(Denied::Unauthenticated.to_string())
                .with_action("Obtain a token from /api/v1/auth/token"),
            AuthError::InvalidToken(_) => AppError::unauthorized("Given token not valid")
                .with_action("Obtain a new token from /api/v1/auth/token"),
            AuthError::PermissionDenied => AppError::forbidden(Denied::Forbidden.to_string()),
            AuthError::Mail(_) => AppError::internal("Could not send the confirmation code")
                .with_action("Try again later"),
            AuthError::Token(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Mail(e) => {
                tracing::error!(error = %e, "Confirmation mail delivery failed");
            }
            AuthError::Token(e) => {
                tracing::error!(error = %e, "Access token encoding failed");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidConfirmationCode => {
                tracing::warn!("Invalid confirmation code submitted");
            }
            AuthError::InvalidToken(reason) => {
                tracing::warn!(reason = %reason, "Bearer token rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<FieldErrors> for AuthError {
    fn from(fields: FieldErrors) -> Self {
        AuthError::Validation(fields)
    }
}

impl From<Denied> for AuthError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => AuthError::Unauthenticated,
            Denied::Forbidden => AuthError::PermissionDenied,
        }
    }
}
