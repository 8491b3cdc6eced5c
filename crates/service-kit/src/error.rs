//! Startup errors and the shared JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::ValidationErrors;
use thiserror::Error;

/// Errors that stop a service binary from starting.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to bind or serve: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialise logging: {0}")]
    Telemetry(String),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Builds the `{"error": message}` body used by every service.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Builds the 400 `{"errors": [{"field", "message"}]}` body for rejected payloads.
pub fn validation_response(errors: &ValidationErrors) -> Response {
    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
}
