//! Reservation endpoints.
//!
//! Creation and completion validate the request, write the reservation and
//! hand it to the workflow engine, returning the engine's result. Reads
//! attach the invoice id from the Billing Service.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, RawQuery, State};
use chrono::{DateTime, Utc};
use common::time::optional_timestamp;
use common::{BikeId, Invoice, Reservation, ReservationState, UserId, ValidationErrors};
use serde::Deserialize;
use service_kit::{JsonBody, RequestContext};

use super::{AppState, fetch_bike, fetch_user, segment, with_query};
use crate::error::{ApiError, Result};

/// Body of `POST /api/reservation`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReservationRequest {
    pub user_id: String,
    pub bike_id: String,
    /// Defaults to the time of the request.
    #[serde(with = "optional_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
}

impl ReservationRequest {
    fn parse(
        self,
    ) -> std::result::Result<(UserId, BikeId, Option<DateTime<Utc>>), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("userId", &self.user_id);
        let bike_id = self.bike_id.trim().parse::<BikeId>();
        if bike_id.is_err() {
            errors.push("bikeId", "must be a valid bike id");
        }
        match bike_id {
            Ok(bike_id) if errors.is_empty() => {
                Ok((UserId::new(self.user_id.trim()), bike_id, self.start_time))
            }
            _ => Err(errors),
        }
    }
}

/// POST /api/reservation
#[tracing::instrument(skip(state, ctx, request), fields(request_id = %ctx.request_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(request): JsonBody<ReservationRequest>,
) -> Result<Json<Reservation>> {
    let (user_id, bike_id, start_time) = request.parse()?;

    let bike = fetch_bike(&state, &ctx, &bike_id.to_string()).await?;
    if !bike.available {
        return Err(ApiError::BadRequest(format!(
            "BikeId '{bike_id}' is not available"
        )));
    }
    let user = fetch_user(&state, &ctx, user_id.as_str()).await?;
    if !user.is_customer() {
        return Err(ApiError::BadRequest("UserId must be a customer".to_string()));
    }

    let reservation = Reservation::booking(user.id, bike.id, start_time, ctx.request_id);
    let created: Reservation = state
        .reservations
        .post_json(&ctx, "/api/reservation", &reservation)
        .await?
        .into_json()?;
    tracing::info!(
        reservation_id = %created.reservation_id,
        bike_id = %created.bike_id,
        "reservation created, submitting to engine"
    );

    Ok(Json(submit(&state, &ctx, &created).await?))
}

/// POST /api/reservation/{id}: completes a booked reservation.
#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id))]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    let mut reservation = fetch_reservation(&state, &ctx, &id).await?;
    if reservation.state != ReservationState::Booked {
        return Err(ApiError::BadRequest(format!(
            "Reservation {id} cannot be completed: expected state {}, found {}",
            ReservationState::Booked,
            reservation.state
        )));
    }

    reservation.state = ReservationState::Completing;
    Ok(Json(submit(&state, &ctx, &reservation).await?))
}

/// GET /api/reservation/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Reservation>> {
    let mut reservation = fetch_reservation(&state, &ctx, &id).await?;
    attach_invoice(&state, &ctx, &mut reservation).await?;
    Ok(Json(reservation))
}

/// GET /api/reservation/allReservations
#[tracing::instrument(skip(state, ctx))]
pub async fn all(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<Vec<Reservation>>> {
    let reservations = state
        .reservations
        .get(&ctx, "/api/allReservations")
        .await?
        .into_json()?;
    Ok(Json(with_invoices(&state, &ctx, reservations).await?))
}

/// GET /api/reservation/user/{userId}?state=
#[tracing::instrument(skip(state, ctx))]
pub async fn by_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Reservation>>> {
    let path = with_query(
        &format!("/api/user/{}/reservations", segment(&user_id)),
        query.as_deref(),
    );
    let reservations = state.reservations.get(&ctx, &path).await?.into_json()?;
    Ok(Json(with_invoices(&state, &ctx, reservations).await?))
}

// -- Helpers --

async fn fetch_reservation(
    state: &AppState,
    ctx: &RequestContext,
    id: &str,
) -> Result<Reservation> {
    Ok(state
        .reservations
        .get(ctx, &format!("/api/reservation/{}", segment(id)))
        .await?
        .into_json()?)
}

/// Hands the reservation to the workflow engine and returns its result.
async fn submit(
    state: &AppState,
    ctx: &RequestContext,
    reservation: &Reservation,
) -> Result<Reservation> {
    let result: Reservation = state
        .engine
        .post_json(ctx, "/api/reservationengine", reservation)
        .await?
        .into_json()?;
    tracing::info!(
        reservation_id = %result.reservation_id,
        state = %result.state,
        "engine finished"
    );
    Ok(result)
}

/// Sets `invoice_id` from the Billing Service; a 404 there means no invoice yet.
async fn attach_invoice(
    state: &AppState,
    ctx: &RequestContext,
    reservation: &mut Reservation,
) -> Result<()> {
    let path = format!(
        "/api/reservation/{}/invoice",
        segment(reservation.reservation_id.as_str())
    );
    match state.billing.get(ctx, &path).await?.into_json::<Invoice>() {
        Ok(invoice) => reservation.invoice_id = Some(invoice.id),
        Err(e) if e.is_not_found() => reservation.invoice_id = None,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn with_invoices(
    state: &AppState,
    ctx: &RequestContext,
    mut reservations: Vec<Reservation>,
) -> Result<Vec<Reservation>> {
    for reservation in &mut reservations {
        attach_invoice(state, ctx, reservation).await?;
    }
    Ok(reservations)
}
