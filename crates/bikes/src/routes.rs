//! Bike Directory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Bike, BikeId, NewBike};
use service_kit::JsonBody;

use crate::error::{BikeError, Result};
use crate::store::{AvailabilityChange, BikeFilter, BikeStore};

/// Shared application state accessible from all handlers.
pub struct AppState<S: BikeStore> {
    pub store: S,
}

fn parse_id(raw: &str) -> Result<BikeId> {
    raw.trim()
        .parse()
        .map_err(|_| BikeError::InvalidId(raw.to_string()))
}

/// GET /api/availableBikes
#[tracing::instrument(skip(state))]
pub async fn available<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(filter): Query<BikeFilter>,
) -> Result<Json<Vec<Bike>>> {
    Ok(Json(state.store.list_available(&filter).await?))
}

/// GET /api/allbikes
#[tracing::instrument(skip(state))]
pub async fn all<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Bike>>> {
    Ok(Json(state.store.list_all().await?))
}

/// POST /api/bikes
#[tracing::instrument(skip(state, bike))]
pub async fn create<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(bike): JsonBody<NewBike>,
) -> Result<Json<Bike>> {
    let bike = state.store.insert(bike).await?;
    tracing::info!(bike_id = %bike.id, owner = %bike.owner_user_id, "bike created");
    Ok(Json(bike))
}

/// GET /api/bikes/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Bike>> {
    let id = parse_id(&id)?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(BikeError::NotFound(id))
}

/// PUT /api/bikes/{id}
#[tracing::instrument(skip(state, bike))]
pub async fn replace<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    JsonBody(bike): JsonBody<NewBike>,
) -> Result<Json<Bike>> {
    let id = parse_id(&id)?;
    state
        .store
        .replace(id, bike)
        .await?
        .map(Json)
        .ok_or(BikeError::NotFound(id))
}

/// DELETE /api/bikes/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    if !state.store.delete(id).await? {
        return Err(BikeError::NotFound(id));
    }
    tracing::info!(bike_id = %id, "bike deleted");
    Ok(StatusCode::OK)
}

/// PATCH /api/bikes/{id}/reserve
#[tracing::instrument(skip(state))]
pub async fn reserve<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    set_availability(&state.store, &id, false).await
}

/// PATCH /api/bikes/{id}/clear
#[tracing::instrument(skip(state))]
pub async fn clear<S: BikeStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    set_availability(&state.store, &id, true).await
}

async fn set_availability<S: BikeStore>(
    store: &S,
    raw_id: &str,
    available: bool,
) -> Result<StatusCode> {
    let id = parse_id(raw_id)?;
    match store.set_availability(id, available).await? {
        AvailabilityChange::Changed => {
            tracing::info!(bike_id = %id, available, "bike availability changed");
            Ok(StatusCode::OK)
        }
        AvailabilityChange::Unchanged => {
            metrics::counter!("bike_availability_conflicts_total").increment(1);
            tracing::warn!(bike_id = %id, available, "bike availability already set");
            Err(BikeError::InvalidReservation(id))
        }
        AvailabilityChange::Missing => Err(BikeError::NotFound(id)),
    }
}
