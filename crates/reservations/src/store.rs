use async_trait::async_trait;
use common::{Reservation, ReservationId, ReservationState, StateUpdate, UpdateResult, UserId};

use crate::error::Result;

/// Storage for reservation records.
///
/// Records are created once and then only rewritten through
/// [`ReservationStore::update_state`]; nothing here deletes them.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Stores a new reservation; fails if the id is taken.
    async fn create(&self, reservation: Reservation) -> Result<Reservation>;

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>>;

    /// Every reservation, oldest request first.
    async fn list_all(&self) -> Result<Vec<Reservation>>;

    /// A user's reservations, oldest request first, optionally in one state only.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        state: Option<ReservationState>,
    ) -> Result<Vec<Reservation>>;

    /// Rewrites state, end time and (when given) invoice id.
    ///
    /// `modified_count` is 0 when the reservation is missing or when the
    /// update leaves every field as it was.
    async fn update_state(&self, id: &ReservationId, update: &StateUpdate) -> Result<UpdateResult>;
}
