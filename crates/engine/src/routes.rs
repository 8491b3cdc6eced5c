//! Workflow engine endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Reservation;
use service_kit::JsonBody;

use crate::error::Result;
use crate::services::{BikeDirectory, BillingService, ReservationStore};
use crate::workflow::{ReservationWorkflow, WorkflowCommand};

/// Shared application state accessible from all handlers.
pub struct AppState<B, Bi, R>
where
    B: BikeDirectory,
    Bi: BillingService,
    R: ReservationStore,
{
    pub workflow: ReservationWorkflow<B, Bi, R>,
}

/// POST /api/reservationengine
#[tracing::instrument(skip(state, reservation))]
pub async fn update_reservation<B, Bi, R>(
    State(state): State<Arc<AppState<B, Bi, R>>>,
    JsonBody(reservation): JsonBody<Reservation>,
) -> Result<Json<Reservation>>
where
    B: BikeDirectory + 'static,
    Bi: BillingService + 'static,
    R: ReservationStore + 'static,
{
    let command = WorkflowCommand::from_reservation(reservation)?;
    Ok(Json(state.workflow.execute(command).await))
}
