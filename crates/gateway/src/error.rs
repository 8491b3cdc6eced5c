//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::ValidationErrors;
use service_kit::{DownstreamError, error_response, validation_response};
use thiserror::Error;

/// Gateway-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller's request was refused by a gateway check.
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid userId. The user id is 32 hexadecimal digits without hyphens.")]
    InvalidUserId,

    /// The payload failed field validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A follow-up call failed after the primary write had succeeded.
    #[error("{0}")]
    Internal(String),

    /// A downstream call failed; its status and body are relayed.
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidUserId => error_response(StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Validation(errors) => validation_response(&errors),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Downstream(err) => err.into_response(),
        }
    }
}

/// Convenience type alias for gateway handler results.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("UserId must be a customer".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidUserId.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("billing failed".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
