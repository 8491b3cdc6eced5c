use async_trait::async_trait;
use common::{Bike, BikeId, BikeType, NewBike};
use serde::Deserialize;

use crate::error::Result;

/// Most bikes returned by an availability search.
pub const AVAILABLE_LIMIT: usize = 30;

/// Filters for the availability search. Every supplied field must match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeFilter {
    #[serde(rename = "type")]
    pub bike_type: Option<BikeType>,
    pub model: Option<String>,
    pub owner_user_id: Option<String>,
    pub max_hourly_cost: Option<f64>,
}

impl BikeFilter {
    /// Returns true if `bike` is available and satisfies every filter.
    pub fn matches(&self, bike: &Bike) -> bool {
        bike.available
            && self.bike_type.is_none_or(|t| bike.bike_type == t)
            && self.model.as_deref().is_none_or(|m| bike.model == m)
            && self
                .owner_user_id
                .as_deref()
                .is_none_or(|o| bike.owner_user_id.as_str() == o)
            && self.max_hourly_cost.is_none_or(|max| bike.hourly_cost <= max)
    }
}

/// Outcome of a compare-and-swap on a bike's availability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityChange {
    /// The flag was flipped to the requested value.
    Changed,
    /// The flag already held the requested value.
    Unchanged,
    /// No bike has that id.
    Missing,
}

/// Storage for bike records.
#[async_trait]
pub trait BikeStore: Send + Sync {
    /// Stores a new bike, returning it with its assigned id and `available = true`.
    async fn insert(&self, bike: NewBike) -> Result<Bike>;

    async fn get(&self, id: BikeId) -> Result<Option<Bike>>;

    /// Every bike, cheapest first.
    async fn list_all(&self) -> Result<Vec<Bike>>;

    /// Available bikes matching `filter`, cheapest first, at most [`AVAILABLE_LIMIT`].
    async fn list_available(&self, filter: &BikeFilter) -> Result<Vec<Bike>>;

    /// Replaces the descriptive fields of a bike; `available` is untouched.
    async fn replace(&self, id: BikeId, bike: NewBike) -> Result<Option<Bike>>;

    /// Returns false if no bike had that id.
    async fn delete(&self, id: BikeId) -> Result<bool>;

    /// Sets `available` only if it currently holds the opposite value.
    async fn set_availability(&self, id: BikeId, available: bool) -> Result<AvailabilityChange>;
}
