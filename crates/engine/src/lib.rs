//! Reservation workflow engine.
//!
//! Advances a reservation through its lifecycle by coordinating the Bike
//! Directory, the Billing Service and the Reservation Store:
//! 1. Booking: reserve the bike, then mark the reservation `Booked`
//! 2. Completion: mark `Completing`, free the bike, invoice the rental,
//!    then mark `Completed`
//!
//! Any failing step moves the reservation to `Failed`. The only
//! compensation is re-reserving the bike when invoicing fails.

pub mod config;
pub mod error;
pub mod pricing;
pub mod routes;
pub mod services;
pub mod workflow;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use metrics_exporter_prometheus::PrometheusHandle;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use services::{
    BikeDirectory, BillingService, HttpBikeDirectory, HttpBillingService, HttpReservationStore,
    InMemoryBikeDirectory, InMemoryBillingService, InMemoryReservationStore, ReservationStore,
};
pub use workflow::{ReservationWorkflow, WorkflowCommand};

use routes::AppState;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3005;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B, Bi, R>(
    workflow: ReservationWorkflow<B, Bi, R>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    B: BikeDirectory + 'static,
    Bi: BillingService + 'static,
    R: ReservationStore + 'static,
{
    let state = Arc::new(AppState { workflow });

    let router = Router::new()
        .route(
            "/api/reservationengine",
            post(routes::update_reservation::<B, Bi, R>),
        )
        .with_state(state);

    service_kit::finish(router, metrics_handle)
}
