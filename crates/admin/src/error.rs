//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use graphica_core::{CategoryError, ProductValidationError, SlugError};

use crate::db::{RepositoryError, SectionUpdateError};
use crate::services::ImportError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Product input rejected.
    #[error("Invalid product: {0}")]
    Product(#[from] ProductValidationError),

    /// Category input rejected.
    #[error("Invalid category: {0}")]
    Category(#[from] CategoryError),

    /// Malformed slug or section key.
    #[error("Invalid identifier: {0}")]
    Slug(#[from] SlugError),

    /// Import aborted.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SectionUpdateError> for AppError {
    fn from(err: SectionUpdateError) -> Self {
        match err {
            SectionUpdateError::Reorder(e) => Self::BadRequest(e.to_string()),
            SectionUpdateError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_)
            | Self::Import(ImportError::Repository(_))
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Product(_) | Self::Category(_) | Self::Slug(_) | Self::Import(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            _ if status.is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use graphica_core::{CategorySlug, ReorderError, SectionKey};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product p-1".to_string());
        assert_eq!(err.to_string(), "Not found: product p-1");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("dup".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Category(CategoryError::SelfParent)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Import(ImportError::MissingColumn("name"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn reorder_rejections_are_bad_requests() {
        let err = AppError::from(SectionUpdateError::Reorder(ReorderError::Unknown(
            SectionKey::parse("ghost").unwrap(),
        )));
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parent_errors_name_the_category() {
        let err = AppError::Category(CategoryError::ParentNotFound(
            CategorySlug::parse("print").unwrap(),
        ));
        assert_eq!(err.to_string(), "Invalid category: parent category print does not exist");
    }
}
