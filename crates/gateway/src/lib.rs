//! API gateway for the bike-sharing services.
//!
//! The single external REST surface. Validates caller input, routes each
//! operation to the service that owns it and assembles composite responses.
//! Every external request gets a fresh `x-request-id`, which is carried on
//! every downstream call it causes.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use metrics_exporter_prometheus::PrometheusHandle;
use service_kit::ServiceClient;
use tower_http::cors::{Any, CorsLayer};

pub use config::GatewayConfig;
pub use error::{ApiError, Result};

use routes::AppState;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Builds one client per downstream service from `config`.
pub fn create_state(config: &GatewayConfig, http: reqwest::Client) -> AppState {
    AppState {
        bikes: ServiceClient::new("bikes", &config.bikes_url, http.clone()),
        users: ServiceClient::new("users", &config.users_url, http.clone()),
        billing: ServiceClient::new("billing", &config.billing_url, http.clone()),
        reservations: ServiceClient::new("reservations", &config.reservations_url, http.clone()),
        engine: ServiceClient::new("engine", &config.engine_url, http),
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let state = Arc::new(state);

    let router = Router::new()
        .route("/api/bike/availableBikes", get(routes::bikes::available))
        .route("/api/bike", post(routes::bikes::create))
        .route(
            "/api/bike/{id}",
            get(routes::bikes::get)
                .patch(routes::bikes::update)
                .delete(routes::bikes::delete),
        )
        .route("/api/user/allUsers", get(routes::users::all))
        .route("/api/user", post(routes::users::create_customer))
        .route("/api/user/vendor", post(routes::users::create_vendor))
        .route(
            "/api/user/{id}",
            get(routes::users::get)
                .patch(routes::users::update)
                .delete(routes::users::delete),
        )
        .route("/api/user/{id}/bikes", get(routes::users::bikes))
        .route("/api/billing/invoice", post(routes::billing::create_invoice))
        .route("/api/billing/invoice/{id}", get(routes::billing::get_invoice))
        .route("/api/billing/customer/{user_id}", get(routes::billing::customer))
        .route(
            "/api/billing/customer/{user_id}/invoices",
            get(routes::billing::customer_invoices),
        )
        .route("/api/billing/vendor/{user_id}", get(routes::billing::vendor))
        .route(
            "/api/billing/vendor/{user_id}/invoices",
            get(routes::billing::vendor_invoices),
        )
        .route("/api/reservation", post(routes::reservations::create))
        .route(
            "/api/reservation/allReservations",
            get(routes::reservations::all),
        )
        .route(
            "/api/reservation/user/{user_id}",
            get(routes::reservations::by_user),
        )
        .route(
            "/api/reservation/{id}",
            get(routes::reservations::get).post(routes::reservations::complete),
        )
        .with_state(state);

    service_kit::finish(router, metrics_handle)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(service_kit::assign_request_id))
}
