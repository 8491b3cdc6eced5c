//! User Directory entry point.

use service_kit::{BootstrapError, ServerConfig};
use users::{InMemoryUserStore, PostgresUserStore};

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let config = ServerConfig::from_env(users::DEFAULT_PORT);
    service_kit::telemetry::init(&config, "users")?;
    let metrics_handle = service_kit::install_metrics()?;

    let app = match &config.database_url {
        Some(url) => {
            let store = PostgresUserStore::new(service_kit::connect_postgres(url).await?);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL user store");
            users::create_app(store, metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory user store");
            users::create_app(InMemoryUserStore::new(), metrics_handle)
        }
    };

    service_kit::serve(app, &config, "users").await
}
