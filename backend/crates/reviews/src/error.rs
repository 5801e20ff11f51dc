//! Reviews Error Types
//!
//! This module provides catalogue and review error variants that integrate
//! with the unified `kernel::error::AppError` system.

use auth::domain::policy::Denied;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{
    app_error::AppError,
    field::{FieldErrors, NON_FIELD},
    kind::ErrorKind,
};
use kernel::pagination::InvalidPage;
use thiserror::Error;

use crate::domain::entities::TermKind;

/// Reviews-specific result type alias
pub type ReviewsResult<T> = Result<T, ReviewsError>;

pub const DUPLICATE_REVIEW_MESSAGE: &str = "You have already reviewed this title.";

/// Reviews-specific error variants
#[derive(Debug, Error)]
pub enum ReviewsError {
    /// Field-level input errors
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Path names a resource that does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Anonymous write
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// Authenticated, but not allowed
    #[error("Permission denied")]
    PermissionDenied,

    /// Page past the end
    #[error("Invalid page")]
    InvalidPage(#[from] InvalidPage),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReviewsError {
    pub fn slug_taken(kind: TermKind) -> Self {
        ReviewsError::Validation(FieldErrors::single(
            "slug",
            format!("{} with this slug already exists.", kind.label()),
        ))
    }

    pub fn duplicate_review() -> Self {
        ReviewsError::Validation(FieldErrors::single(NON_FIELD, DUPLICATE_REVIEW_MESSAGE))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewsError::Validation(_) => ErrorKind::BadRequest,
            ReviewsError::NotFound(_) | ReviewsError::InvalidPage(_) => ErrorKind::NotFound,
            ReviewsError::Unauthenticated => ErrorKind::Unauthorized,
            ReviewsError::PermissionDenied => ErrorKind::Forbidden,
            ReviewsError::Database(_) | ReviewsError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            ReviewsError::Validation(fields) => AppError::validation(fields.clone()),
            ReviewsError::NotFound(_) | ReviewsError::InvalidPage(_) => {
                AppError::not_found(self.to_string())
            }
            ReviewsError::Unauthenticated => {
                AppError::unauthorized(Denied::Unauthenticated.to_string())
                    .with_action("Obtain a token from /api/v1/auth/token")
            }
            ReviewsError::PermissionDenied => AppError::forbidden(Denied::Forbidden.to_string()),
            ReviewsError::Database(_) | ReviewsError::Internal(_) => {
                AppError::internal("Internal server error")
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ReviewsError::Database(e) => {
                tracing::error!(error = %e, "Reviews database error");
            }
            ReviewsError::Internal(msg) => {
                tracing::error!(message = %msg, "Reviews internal error");
            }
            ReviewsError::PermissionDenied => {
                tracing::warn!("Reviews write denied");
            }
            _ => {
                tracing::debug!(error = %self, "Reviews error");
            }
        }
    }
}

impl From<ReviewsError> for AppError {
    fn from(err: ReviewsError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for ReviewsError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<FieldErrors> for ReviewsError {
    fn from(fields: FieldErrors) -> Self {
        ReviewsError::Validation(fields)
    }
}

impl From<Denied> for ReviewsError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => ReviewsError::Unauthenticated,
            Denied::Forbidden => ReviewsError::PermissionDenied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ReviewsError::duplicate_review().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReviewsError::NotFound("Title").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ReviewsError::from(Denied::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ReviewsError::from(Denied::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ReviewsError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_field_errors() {
        let app = ReviewsError::slug_taken(TermKind::Genre).to_app_error();
        assert_eq!(
            app.fields().unwrap().messages("slug"),
            ["genre with this slug already exists."]
        );

        let app = ReviewsError::duplicate_review().to_app_error();
        assert_eq!(
            app.fields().unwrap().messages(NON_FIELD),
            [DUPLICATE_REVIEW_MESSAGE]
        );
    }

    #[test]
    fn test_not_found_message() {
        let app = ReviewsError::NotFound("Review").to_app_error();
        assert_eq!(app.message(), "Review not found");
    }
}
