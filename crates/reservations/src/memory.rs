use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{
    Reservation, ReservationId, ReservationState, StateUpdate, UpdateResult, UserId, Validate,
};
use tokio::sync::RwLock;

use crate::error::{ReservationError, Result};
use crate::store::ReservationStore;

/// In-memory reservation store used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    reservations.sort_by(|a, b| {
        a.request_time
            .cmp(&b.request_time)
            .then_with(|| a.reservation_id.cmp(&b.reservation_id))
    });
    reservations
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn create(&self, reservation: Reservation) -> Result<Reservation> {
        reservation.validate()?;
        let mut reservations = self.reservations.write().await;
        if reservations.contains_key(&reservation.reservation_id) {
            return Err(ReservationError::AlreadyExists(reservation.reservation_id));
        }
        reservations.insert(reservation.reservation_id.clone(), reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>> {
        Ok(self.reservations.read().await.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Reservation>> {
        Ok(sorted(self.reservations.read().await.values().cloned().collect()))
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        state: Option<ReservationState>,
    ) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(sorted(
            reservations
                .values()
                .filter(|r| &r.user_id == user_id)
                .filter(|r| state.is_none_or(|s| r.state == s))
                .cloned()
                .collect(),
        ))
    }

    async fn update_state(&self, id: &ReservationId, update: &StateUpdate) -> Result<UpdateResult> {
        let mut reservations = self.reservations.write().await;
        let Some(reservation) = reservations.get_mut(id) else {
            return Ok(UpdateResult::unmatched());
        };
        let modified = reservation.apply(update);
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }
}
