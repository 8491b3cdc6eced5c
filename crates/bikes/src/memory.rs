use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Bike, BikeId, NewBike};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::{AVAILABLE_LIMIT, AvailabilityChange, BikeFilter, BikeStore};

/// In-memory bike store used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryBikeStore {
    bikes: Arc<RwLock<HashMap<BikeId, Bike>>>,
}

impl InMemoryBikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.bikes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bikes.read().await.is_empty()
    }
}

fn by_cost(mut bikes: Vec<Bike>) -> Vec<Bike> {
    bikes.sort_by(|a, b| a.hourly_cost.total_cmp(&b.hourly_cost));
    bikes
}

#[async_trait]
impl BikeStore for InMemoryBikeStore {
    async fn insert(&self, bike: NewBike) -> Result<Bike> {
        let bike = bike.into_bike(BikeId::new(), true)?;
        self.bikes.write().await.insert(bike.id, bike.clone());
        Ok(bike)
    }

    async fn get(&self, id: BikeId) -> Result<Option<Bike>> {
        Ok(self.bikes.read().await.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Bike>> {
        let bikes = self.bikes.read().await.values().cloned().collect();
        Ok(by_cost(bikes))
    }

    async fn list_available(&self, filter: &BikeFilter) -> Result<Vec<Bike>> {
        let bikes = self
            .bikes
            .read()
            .await
            .values()
            .filter(|bike| filter.matches(bike))
            .cloned()
            .collect();
        let mut bikes = by_cost(bikes);
        bikes.truncate(AVAILABLE_LIMIT);
        Ok(bikes)
    }

    async fn replace(&self, id: BikeId, bike: NewBike) -> Result<Option<Bike>> {
        let mut bikes = self.bikes.write().await;
        let Some(existing) = bikes.get_mut(&id) else {
            return Ok(None);
        };
        *existing = bike.into_bike(id, existing.available)?;
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: BikeId) -> Result<bool> {
        Ok(self.bikes.write().await.remove(&id).is_some())
    }

    async fn set_availability(&self, id: BikeId, available: bool) -> Result<AvailabilityChange> {
        let mut bikes = self.bikes.write().await;
        Ok(match bikes.get_mut(&id) {
            None => AvailabilityChange::Missing,
            Some(bike) if bike.available == available => AvailabilityChange::Unchanged,
            Some(bike) => {
                bike.available = available;
                AvailabilityChange::Changed
            }
        })
    }
}
