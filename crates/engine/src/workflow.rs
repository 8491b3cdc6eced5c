//! The reservation workflow.
//!
//! Each transition is a fixed sequence of calls to the collaborators. Every
//! call writes its side effect before the next one is attempted, and there
//! is no durable log of where a transition got to: a crash between steps can
//! leave a bike marked unavailable with no active reservation, or an invoice
//! whose reservation never reached `Completed`.
//!
//! Booking:
//! ```text
//! reserve bike ──► store Booked
//!      │                │ (0 modified, bike stays reserved)
//!      └────────────────┴──► Failed
//! ```
//!
//! Completion:
//! ```text
//! store Completing ──► free bike ──► create invoice ──► store Completed
//!        │                 │               │ (re-reserve bike)   │
//!        └─────────────────┴───────────────┴─────────────────────┴──► Failed
//! ```

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{BikeId, Invoice, NewInvoice, Reservation, ReservationState, StateUpdate};
use service_kit::RequestContext;

use crate::error::{EngineError, Result};
use crate::pricing;
use crate::services::{BikeDirectory, BillingService, ReservationStore};

/// A request to advance one reservation.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowCommand {
    /// Hold the bike and move `Booking` to `Booked`.
    Book(Reservation),
    /// Release the bike, invoice the rental and move to `Completed`.
    Complete(Reservation),
}

impl WorkflowCommand {
    /// Picks the command implied by the reservation's current state.
    pub fn from_reservation(reservation: Reservation) -> Result<Self> {
        match reservation.state {
            ReservationState::Booking => Ok(Self::Book(reservation)),
            ReservationState::Completing => Ok(Self::Complete(reservation)),
            state => Err(EngineError::UnsupportedState {
                reservation_id: reservation.reservation_id,
                state,
            }),
        }
    }

    /// Metric label for the transition.
    pub fn transition(&self) -> &'static str {
        match self {
            Self::Book(_) => "book",
            Self::Complete(_) => "complete",
        }
    }

    pub fn reservation(&self) -> &Reservation {
        match self {
            Self::Book(reservation) | Self::Complete(reservation) => reservation,
        }
    }
}

/// Drives reservations through their lifecycle.
///
/// Concurrent commands for the same reservation are not serialised; the
/// Bike Directory's conditional reserve/free is the only guard.
pub struct ReservationWorkflow<B, Bi, R>
where
    B: BikeDirectory,
    Bi: BillingService,
    R: ReservationStore,
{
    bikes: B,
    billing: Bi,
    reservations: R,
}

impl<B, Bi, R> ReservationWorkflow<B, Bi, R>
where
    B: BikeDirectory,
    Bi: BillingService,
    R: ReservationStore,
{
    /// Creates a new workflow over the given collaborators.
    pub fn new(bikes: B, billing: Bi, reservations: R) -> Self {
        Self {
            bikes,
            billing,
            reservations,
        }
    }

    /// Runs a command to completion and returns the reservation as last written.
    ///
    /// Never fails: a step that goes wrong moves the reservation to `Failed`.
    #[tracing::instrument(
        skip(self, command),
        fields(
            transition = command.transition(),
            reservation_id = %command.reservation().reservation_id,
            request_id = %command.reservation().request_id,
        )
    )]
    pub async fn execute(&self, command: WorkflowCommand) -> Reservation {
        let transition = command.transition();
        let started = Instant::now();
        let ctx = RequestContext::new(command.reservation().request_id);

        let reservation = match command {
            WorkflowCommand::Book(reservation) => self.book(&ctx, reservation).await,
            WorkflowCommand::Complete(reservation) => self.complete(&ctx, reservation).await,
        };

        let outcome = if reservation.state == ReservationState::Failed {
            "failed"
        } else {
            "succeeded"
        };
        let duration = started.elapsed().as_secs_f64();
        metrics::counter!(
            "reservation_transitions_total",
            "transition" => transition,
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("reservation_transition_duration_seconds", "transition" => transition)
            .record(duration);
        tracing::info!(state = %reservation.state, duration, "transition finished");

        reservation
    }

    async fn book(&self, ctx: &RequestContext, mut reservation: Reservation) -> Reservation {
        tracing::info!(bike_id = %reservation.bike_id, "creating a booking");
        reservation.end_time = None;

        if let Err(e) = self.bikes.reserve(ctx, reservation.bike_id).await {
            tracing::warn!(
                error = %e,
                bike_id = %reservation.bike_id,
                "bike could not be reserved"
            );
            return self.fail(ctx, reservation).await;
        }

        reservation.state = ReservationState::Booked;
        if !self.persist(ctx, &reservation).await {
            return self.fail(ctx, reservation).await;
        }

        tracing::info!("booking created");
        reservation
    }

    async fn complete(&self, ctx: &RequestContext, mut reservation: Reservation) -> Reservation {
        tracing::info!(bike_id = %reservation.bike_id, "completing a booking");
        reservation.state = ReservationState::Completing;
        reservation.end_time = None;
        if !self.persist(ctx, &reservation).await {
            return self.fail(ctx, reservation).await;
        }

        if let Err(e) = self.bikes.free(ctx, reservation.bike_id).await {
            tracing::warn!(error = %e, bike_id = %reservation.bike_id, "bike could not be freed");
            return self.fail(ctx, reservation).await;
        }

        let end_time = common::time::now();
        match self.raise_invoice(ctx, &reservation, end_time).await {
            Ok(invoice) => {
                tracing::info!(
                    invoice_id = %invoice.id,
                    amount = invoice.amount,
                    "invoice created"
                );
                reservation.state = ReservationState::Completed;
                reservation.end_time = Some(end_time);
                reservation.invoice_id = Some(invoice.id);
            }
            Err(e) => {
                tracing::error!(error = %e, "could not create invoice, rolling back");
                self.rereserve_bike(ctx, reservation.bike_id).await;
                return self.fail(ctx, reservation).await;
            }
        }

        if !self.persist(ctx, &reservation).await {
            return self.fail(ctx, reservation).await;
        }

        tracing::info!("booking completed");
        reservation
    }

    /// Looks up the bike for its price and owner, then raises the invoice.
    async fn raise_invoice(
        &self,
        ctx: &RequestContext,
        reservation: &Reservation,
        end_time: DateTime<Utc>,
    ) -> Result<Invoice> {
        let bike = self.bikes.get(ctx, reservation.bike_id).await?;
        let invoice = NewInvoice {
            reservation_id: reservation.reservation_id.to_string(),
            customer_id: reservation.user_id.to_string(),
            vendor_id: bike.owner_user_id.to_string(),
            bike_id: reservation.bike_id.to_string(),
            amount: pricing::rental_amount(reservation.start_time, end_time, bike.hourly_cost),
            ..NewInvoice::default()
        };
        self.billing.create_invoice(ctx, &invoice).await
    }

    /// Writes the reservation's state, end time and invoice id.
    ///
    /// Returns true only if the store reports a modified record.
    async fn persist(&self, ctx: &RequestContext, reservation: &Reservation) -> bool {
        let update = StateUpdate {
            state: reservation.state,
            end_time: reservation.end_time,
            invoice_id: reservation.invoice_id,
        };
        match self
            .reservations
            .update_state(ctx, &reservation.reservation_id, &update)
            .await
        {
            Ok(result) if result.is_modified() => true,
            Ok(result) => {
                tracing::warn!(
                    state = %reservation.state,
                    matched = result.matched_count,
                    modified = result.modified_count,
                    "reservation not updated"
                );
                false
            }
            Err(e) => {
                tracing::warn!(state = %reservation.state, error = %e, "reservation update failed");
                false
            }
        }
    }

    /// Puts the bike back on hold after a failed completion. Best-effort.
    async fn rereserve_bike(&self, ctx: &RequestContext, bike_id: BikeId) {
        let outcome = match self.bikes.reserve(ctx, bike_id).await {
            Ok(()) => "succeeded",
            Err(e) => {
                tracing::error!(error = %e, %bike_id, "compensating bike reservation failed");
                "failed"
            }
        };
        metrics::counter!(
            "reservation_transitions_total",
            "transition" => "compensate",
            "outcome" => outcome
        )
        .increment(1);
    }

    /// Marks the reservation `Failed`. Best-effort: a failed write is only logged.
    ///
    /// The end time is cleared and no invoice id is written.
    async fn fail(&self, ctx: &RequestContext, mut reservation: Reservation) -> Reservation {
        tracing::warn!(from = %reservation.state, "failing reservation");
        reservation.state = ReservationState::Failed;
        reservation.end_time = None;
        reservation.invoice_id = None;

        let update = StateUpdate::new(ReservationState::Failed, None);
        let outcome = match self
            .reservations
            .update_state(ctx, &reservation.reservation_id, &update)
            .await
        {
            Ok(result) => {
                if !result.is_modified() {
                    tracing::warn!(matched = result.matched_count, "failed state not written");
                }
                "succeeded"
            }
            Err(e) => {
                tracing::error!(error = %e, "could not mark reservation failed");
                "failed"
            }
        };
        metrics::counter!(
            "reservation_transitions_total",
            "transition" => "fail",
            "outcome" => outcome
        )
        .increment(1);

        reservation
    }
}
