//! Billing service entry point.

use billing::{InMemoryBillingStore, PostgresBillingStore};
use service_kit::{BootstrapError, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let config = ServerConfig::from_env(billing::DEFAULT_PORT);
    service_kit::telemetry::init(&config, "billing")?;
    let metrics_handle = service_kit::install_metrics()?;

    let app = match &config.database_url {
        Some(url) => {
            let store = PostgresBillingStore::new(service_kit::connect_postgres(url).await?);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL billing store");
            billing::create_app(store, metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory billing store");
            billing::create_app(InMemoryBillingStore::new(), metrics_handle)
        }
    };

    service_kit::serve(app, &config, "billing").await
}
