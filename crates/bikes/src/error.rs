use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{BikeId, ValidationErrors};
use service_kit::{error_response, validation_response};
use thiserror::Error;

/// Errors raised by the Bike Directory.
#[derive(Debug, Error)]
pub enum BikeError {
    #[error("BikeId \"{0}\" does not exist!")]
    NotFound(BikeId),

    #[error("{0} is not a valid bikeId!")]
    InvalidId(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    /// The availability flag was already in the requested state.
    #[error("Invalid reservation request was made for BikeId {0}")]
    InvalidReservation(BikeId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored bike is corrupt: {0}")]
    Corrupt(String),
}

impl From<ValidationErrors> for BikeError {
    fn from(errors: ValidationErrors) -> Self {
        BikeError::Validation(errors)
    }
}

impl IntoResponse for BikeError {
    fn into_response(self) -> Response {
        match &self {
            BikeError::Validation(errors) => validation_response(errors),
            BikeError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            BikeError::InvalidId(_) | BikeError::InvalidReservation(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            BikeError::Database(_) | BikeError::Corrupt(_) => {
                tracing::error!(error = %self, "bike store failure");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BikeError>;
