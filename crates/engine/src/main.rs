//! Workflow engine entry point.

use engine::{
    EngineConfig, HttpBikeDirectory, HttpBillingService, HttpReservationStore, ReservationWorkflow,
};
use service_kit::{BootstrapError, ServiceClient};

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let config = EngineConfig::from_env();
    service_kit::telemetry::init(&config.server, "engine")?;
    let metrics_handle = service_kit::install_metrics()?;

    let http = service_kit::http_client(config.server.request_timeout)?;
    let workflow = ReservationWorkflow::new(
        HttpBikeDirectory::new(ServiceClient::new("bikes", &config.bikes_url, http.clone())),
        HttpBillingService::new(ServiceClient::new("billing", &config.billing_url, http.clone())),
        HttpReservationStore::new(ServiceClient::new(
            "reservations",
            &config.reservations_url,
            http,
        )),
    );
    tracing::info!(
        bikes = %config.bikes_url,
        billing = %config.billing_url,
        reservations = %config.reservations_url,
        "collaborators configured"
    );

    let app = engine::create_app(workflow, metrics_handle);
    service_kit::serve(app, &config.server, "engine").await
}
