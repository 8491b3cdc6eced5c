use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ReservationId, UserId, ValidationErrors};
use service_kit::{error_response, validation_response};
use thiserror::Error;

/// Errors raised by the Billing service.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not a valid id")]
    InvalidId(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Reservation {0} already has an invoice")]
    DuplicateInvoice(ReservationId),

    #[error("User {0} already has a billing profile")]
    ProfileExists(UserId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ValidationErrors> for BillingError {
    fn from(errors: ValidationErrors) -> Self {
        BillingError::Validation(errors)
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        match &self {
            BillingError::Validation(errors) => validation_response(errors),
            BillingError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            BillingError::InvalidId(_)
            | BillingError::DuplicateInvoice(_)
            | BillingError::ProfileExists(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            BillingError::Database(_) => {
                tracing::error!(error = %self, "billing store failure");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
