//! Reservation Store entry point.

use reservations::{InMemoryReservationStore, PostgresReservationStore};
use service_kit::{BootstrapError, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let config = ServerConfig::from_env(reservations::DEFAULT_PORT);
    service_kit::telemetry::init(&config, "reservations")?;
    let metrics_handle = service_kit::install_metrics()?;

    let app = match &config.database_url {
        Some(url) => {
            let store = PostgresReservationStore::new(service_kit::connect_postgres(url).await?);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL reservation store");
            reservations::create_app(store, metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory reservation store");
            reservations::create_app(InMemoryReservationStore::new(), metrics_handle)
        }
    };

    service_kit::serve(app, &config, "reservations").await
}
