use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ReservationId, ValidationErrors};
use service_kit::{error_response, validation_response};
use thiserror::Error;

/// Errors raised by the Reservation Store.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("No reservation found for reservationId: {0}")]
    NotFound(ReservationId),

    #[error("Reservation {0} already exists")]
    AlreadyExists(ReservationId),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored reservation is corrupt: {0}")]
    Corrupt(String),
}

impl From<ValidationErrors> for ReservationError {
    fn from(errors: ValidationErrors) -> Self {
        ReservationError::Validation(errors)
    }
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        match &self {
            ReservationError::Validation(errors) => validation_response(errors),
            ReservationError::NotFound(_) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            ReservationError::AlreadyExists(_) | ReservationError::InvalidState(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            ReservationError::Database(_) | ReservationError::Corrupt(_) => {
                tracing::error!(error = %self, "reservation store failure");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ReservationError>;
