//! Reservation Store service.
//!
//! Owns reservation records. The workflow engine rewrites their state
//! through a conditional update whose matched/modified counts are the only
//! consistency signal it gets back.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;

pub use error::{ReservationError, Result};
pub use memory::InMemoryReservationStore;
pub use postgres::PostgresReservationStore;
pub use store::ReservationStore;

use routes::AppState;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3004;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ReservationStore + 'static>(
    store: S,
    metrics_handle: PrometheusHandle,
) -> Router {
    let state = Arc::new(AppState { store });

    let router = Router::new()
        .route("/api/reservation", post(routes::create::<S>))
        .route("/api/reservation/{id}", get(routes::get::<S>))
        .route("/api/reservation/{id}/state", patch(routes::update_state::<S>))
        .route("/api/allReservations", get(routes::all::<S>))
        .route("/api/user/{user_id}/reservations", get(routes::by_user::<S>))
        .with_state(state);

    service_kit::finish(router, metrics_handle)
}
