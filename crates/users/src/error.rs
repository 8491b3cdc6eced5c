use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{UserId, ValidationErrors};
use service_kit::{error_response, validation_response};
use thiserror::Error;

/// Errors raised by the User Directory.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound(UserId),

    #[error("User {0} already exists")]
    AlreadyExists(UserId),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored user is corrupt: {0}")]
    Corrupt(String),
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        UserError::Validation(errors)
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match &self {
            UserError::Validation(errors) => validation_response(errors),
            UserError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            UserError::AlreadyExists(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            UserError::Database(_) | UserError::Corrupt(_) => {
                tracing::error!(error = %self, "user store failure");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, UserError>;
