//! Billing service: invoices plus customer and vendor billing profiles.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;

pub use error::{BillingError, Result};
pub use memory::InMemoryBillingStore;
pub use postgres::PostgresBillingStore;
pub use store::{BillingStore, Party};

use routes::AppState;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3003;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BillingStore + 'static>(store: S, metrics_handle: PrometheusHandle) -> Router {
    let state = Arc::new(AppState { store });

    let router = Router::new()
        .route("/api/invoice", post(routes::create_invoice::<S>))
        .route("/api/invoice/{id}", get(routes::get_invoice::<S>))
        .route(
            "/api/reservation/{id}/invoice",
            get(routes::invoice_for_reservation::<S>),
        )
        .route(
            "/api/customer",
            post(routes::create_customer::<S>).patch(routes::update_customer::<S>),
        )
        .route("/api/customer/{user_id}", get(routes::get_customer::<S>))
        .route(
            "/api/customer/{user_id}/invoices",
            get(routes::customer_invoices::<S>),
        )
        .route(
            "/api/vendor",
            post(routes::create_vendor::<S>).patch(routes::update_vendor::<S>),
        )
        .route("/api/vendor/{user_id}", get(routes::get_vendor::<S>))
        .route(
            "/api/vendor/{user_id}/invoices",
            get(routes::vendor_invoices::<S>),
        )
        .with_state(state);

    service_kit::finish(router, metrics_handle)
}
