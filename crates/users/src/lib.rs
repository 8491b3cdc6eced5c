//! User Directory service: customer and vendor records.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;

pub use error::{Result, UserError};
pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use store::UserStore;

use routes::AppState;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3002;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: UserStore + 'static>(store: S, metrics_handle: PrometheusHandle) -> Router {
    let state = Arc::new(AppState { store });

    let router = Router::new()
        .route("/api/allUsers", get(routes::all::<S>))
        .route("/api/users", post(routes::create::<S>))
        .route(
            "/api/users/{id}",
            get(routes::get::<S>)
                .put(routes::update::<S>)
                .delete(routes::delete::<S>),
        )
        .with_state(state);

    service_kit::finish(router, metrics_handle)
}
