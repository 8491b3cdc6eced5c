//! Reservation Store collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{Reservation, ReservationId, ReservationState, StateUpdate, UpdateResult};
use service_kit::{RequestContext, ServiceClient};

use crate::error::{EngineError, Result};

const SERVICE: &str = "reservations";

/// The one write the workflow makes to reservation records.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Conditionally rewrites state, end time and invoice id.
    ///
    /// A `modified_count` of 0 means nothing was written.
    async fn update_state(
        &self,
        ctx: &RequestContext,
        reservation_id: &ReservationId,
        update: &StateUpdate,
    ) -> Result<UpdateResult>;
}

/// Reservation Store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReservationStore {
    client: ServiceClient,
}

impl HttpReservationStore {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReservationStore for HttpReservationStore {
    async fn update_state(
        &self,
        ctx: &RequestContext,
        reservation_id: &ReservationId,
        update: &StateUpdate,
    ) -> Result<UpdateResult> {
        Ok(self
            .client
            .patch_json(ctx, &format!("/api/reservation/{reservation_id}/state"), update)
            .await?
            .into_json()?)
    }
}

#[derive(Debug, Default)]
struct InMemoryReservationState {
    reservations: HashMap<ReservationId, Reservation>,
    fail_on_update: bool,
    ignored_state: Option<ReservationState>,
}

/// In-memory reservation store for tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    state: Arc<Mutex<InMemoryReservationState>>,
}

impl InMemoryReservationStore {
    /// Creates an empty in-memory reservation store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryReservationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, reservation: Reservation) {
        self.lock()
            .reservations
            .insert(reservation.reservation_id.clone(), reservation);
    }

    pub fn get(&self, reservation_id: &ReservationId) -> Option<Reservation> {
        self.lock().reservations.get(reservation_id).cloned()
    }

    /// Configures the store to fail every update.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.lock().fail_on_update = fail;
    }

    /// Configures the store to match but not modify writes of `state`.
    pub fn set_ignored_state(&self, state: Option<ReservationState>) {
        self.lock().ignored_state = state;
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn update_state(
        &self,
        _ctx: &RequestContext,
        reservation_id: &ReservationId,
        update: &StateUpdate,
    ) -> Result<UpdateResult> {
        let mut state = self.lock();
        if state.fail_on_update {
            return Err(EngineError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        let ignored = state.ignored_state == Some(update.state);
        Ok(match state.reservations.get_mut(reservation_id) {
            Some(_) if ignored => UpdateResult {
                matched_count: 1,
                modified_count: 0,
            },
            Some(reservation) => UpdateResult {
                matched_count: 1,
                modified_count: u64::from(reservation.apply(update)),
            },
            None => UpdateResult::unmatched(),
        })
    }
}
