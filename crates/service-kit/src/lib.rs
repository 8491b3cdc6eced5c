//! HTTP plumbing shared by the bike-sharing services.
//!
//! Configuration, structured logging, metrics, request correlation and the
//! client used for calls between services.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod server;
pub mod telemetry;

pub use client::{DownstreamError, DownstreamResponse, ServiceClient, http_client};
pub use config::{ServerConfig, downstream_url};
pub use context::{REQUEST_ID_HEADER, RequestContext, assign_request_id, propagate_request_id};
pub use error::{BootstrapError, error_response, validation_response};
pub use extract::JsonBody;
pub use server::{finish, serve, shutdown_signal};
pub use telemetry::{LogFormat, install_metrics};

/// Connects a PostgreSQL pool for a service store.
pub async fn connect_postgres(url: &str) -> Result<sqlx::PgPool, BootstrapError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await?;
    Ok(pool)
}
