//! API gateway entry point.

use gateway::GatewayConfig;
use service_kit::BootstrapError;

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let config = GatewayConfig::from_env();
    service_kit::telemetry::init(&config.server, "gateway")?;
    let metrics_handle = service_kit::install_metrics()?;

    let http = service_kit::http_client(config.server.request_timeout)?;
    let state = gateway::create_state(&config, http);
    tracing::info!(
        bikes = %config.bikes_url,
        users = %config.users_url,
        billing = %config.billing_url,
        reservations = %config.reservations_url,
        engine = %config.engine_url,
        "downstream services configured"
    );

    let app = gateway::create_app(state, metrics_handle);
    service_kit::serve(app, &config.server, "gateway").await
}
