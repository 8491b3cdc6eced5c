//! Workflow engine error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ReservationId, ReservationState};
use service_kit::{DownstreamError, error_response};
use thiserror::Error;

/// Errors that can occur while advancing a reservation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The reservation is not in a state the engine acts on.
    #[error(
        "Reservation {reservation_id} is {state}; only Booking or Completing reservations can be advanced"
    )]
    UnsupportedState {
        reservation_id: ReservationId,
        state: ReservationState,
    },

    /// A collaborator turned the request down.
    #[error("{service} service rejected the request: {reason}")]
    Rejected {
        service: &'static str,
        reason: String,
    },

    /// A collaborator could not be reached.
    #[error("{service} service is unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// An HTTP call to a collaborator failed.
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        match self {
            EngineError::Downstream(err) => err.into_response(),
            EngineError::UnsupportedState { .. } | EngineError::Rejected { .. } => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            EngineError::Unavailable { .. } => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
