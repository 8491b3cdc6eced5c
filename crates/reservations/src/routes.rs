//! Reservation Store endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{Reservation, ReservationId, ReservationState, StateUpdate, UpdateResult, UserId};
use serde::Deserialize;
use service_kit::JsonBody;

use crate::error::{ReservationError, Result};
use crate::store::ReservationStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ReservationStore> {
    pub store: S,
}

/// Query parameters for a user's reservations.
#[derive(Debug, Default, Deserialize)]
pub struct UserReservationsQuery {
    pub state: Option<String>,
}

impl UserReservationsQuery {
    fn state(&self) -> Result<Option<ReservationState>> {
        match self.state.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(ReservationError::InvalidState),
        }
    }
}

/// POST /api/reservation
#[tracing::instrument(skip(state, reservation))]
pub async fn create<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(reservation): JsonBody<Reservation>,
) -> Result<Json<Reservation>> {
    let reservation = state.store.create(reservation).await?;
    tracing::info!(
        reservation_id = %reservation.reservation_id,
        request_id = %reservation.request_id,
        state = %reservation.state,
        "reservation created"
    );
    Ok(Json(reservation))
}

/// GET /api/reservation/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    let id = ReservationId::new(id);
    match state.store.get(&id).await? {
        Some(reservation) => Ok(Json(reservation)),
        None => Err(ReservationError::NotFound(id)),
    }
}

/// GET /api/allReservations
#[tracing::instrument(skip(state))]
pub async fn all<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Reservation>>> {
    let reservations = state.store.list_all().await?;
    tracing::debug!(count = reservations.len(), "returning all reservations");
    Ok(Json(reservations))
}

/// GET /api/user/{userId}/reservations
#[tracing::instrument(skip(state))]
pub async fn by_user<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    Query(query): Query<UserReservationsQuery>,
) -> Result<Json<Vec<Reservation>>> {
    let filter = query.state()?;
    let reservations = state
        .store
        .list_by_user(&UserId::new(user_id), filter)
        .await?;
    Ok(Json(reservations))
}

/// PATCH /api/reservation/{id}/state
#[tracing::instrument(skip(state, update))]
pub async fn update_state<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<StateUpdate>,
) -> Result<Json<UpdateResult>> {
    let id = ReservationId::new(id);
    let result = state.store.update_state(&id, &update).await?;
    if result.is_modified() {
        tracing::info!(reservation_id = %id, state = %update.state, "reservation updated");
    } else {
        tracing::warn!(
            reservation_id = %id,
            state = %update.state,
            matched = result.matched_count,
            "reservation update modified nothing"
        );
    }
    Ok(Json(result))
}
