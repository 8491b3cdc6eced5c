//! Bike Directory entry point.

use bikes::{InMemoryBikeStore, PostgresBikeStore};
use service_kit::{BootstrapError, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    // 1. Configuration and telemetry
    let config = ServerConfig::from_env(bikes::DEFAULT_PORT);
    service_kit::telemetry::init(&config, "bikes")?;
    let metrics_handle = service_kit::install_metrics()?;

    // 2. Store selection
    let app = match &config.database_url {
        Some(url) => {
            let store = PostgresBikeStore::new(service_kit::connect_postgres(url).await?);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL bike store");
            bikes::create_app(store, metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory bike store");
            bikes::create_app(InMemoryBikeStore::new(), metrics_handle)
        }
    };

    // 3. Serve
    service_kit::serve(app, &config, "bikes").await
}
