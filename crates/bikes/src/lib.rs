//! Bike Directory service.
//!
//! Stores bike records and guards their availability flag with
//! compare-and-swap updates, so a bike can only be reserved once.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;

pub use error::{BikeError, Result};
pub use memory::InMemoryBikeStore;
pub use postgres::PostgresBikeStore;
pub use store::{AVAILABLE_LIMIT, AvailabilityChange, BikeFilter, BikeStore};

use routes::AppState;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3001;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BikeStore + 'static>(store: S, metrics_handle: PrometheusHandle) -> Router {
    let state = Arc::new(AppState { store });

    let router = Router::new()
        .route("/api/availableBikes", get(routes::available::<S>))
        .route("/api/allbikes", get(routes::all::<S>))
        .route("/api/bikes", post(routes::create::<S>))
        .route(
            "/api/bikes/{id}",
            get(routes::get::<S>)
                .put(routes::replace::<S>)
                .delete(routes::delete::<S>),
        )
        .route("/api/bikes/{id}/reserve", patch(routes::reserve::<S>))
        .route("/api/bikes/{id}/clear", patch(routes::clear::<S>))
        .with_state(state);

    service_kit::finish(router, metrics_handle)
}
