//! Bike Directory collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{Bike, BikeId};
use service_kit::{RequestContext, ServiceClient};

use crate::error::{EngineError, Result};

const SERVICE: &str = "bikes";

/// Availability operations the workflow needs from the Bike Directory.
#[async_trait]
pub trait BikeDirectory: Send + Sync {
    /// Marks an available bike as taken. Fails if it is already taken.
    async fn reserve(&self, ctx: &RequestContext, bike_id: BikeId) -> Result<()>;

    /// Marks a taken bike as available again. Fails if it is already available.
    async fn free(&self, ctx: &RequestContext, bike_id: BikeId) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, bike_id: BikeId) -> Result<Bike>;
}

/// Bike Directory reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBikeDirectory {
    client: ServiceClient,
}

impl HttpBikeDirectory {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BikeDirectory for HttpBikeDirectory {
    async fn reserve(&self, ctx: &RequestContext, bike_id: BikeId) -> Result<()> {
        self.client
            .patch(ctx, &format!("/api/bikes/{bike_id}/reserve"))
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn free(&self, ctx: &RequestContext, bike_id: BikeId) -> Result<()> {
        self.client
            .patch(ctx, &format!("/api/bikes/{bike_id}/clear"))
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get(&self, ctx: &RequestContext, bike_id: BikeId) -> Result<Bike> {
        Ok(self
            .client
            .get(ctx, &format!("/api/bikes/{bike_id}"))
            .await?
            .into_json()?)
    }
}

#[derive(Debug, Default)]
struct InMemoryBikeState {
    bikes: HashMap<BikeId, Bike>,
    fail_on_reserve: bool,
    fail_on_free: bool,
    reserve_calls: usize,
}

/// In-memory bike directory for tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBikeDirectory {
    state: Arc<Mutex<InMemoryBikeState>>,
}

impl InMemoryBikeDirectory {
    /// Creates an empty in-memory bike directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryBikeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_bike(&self, bike: Bike) {
        self.lock().bikes.insert(bike.id, bike);
    }

    /// Returns the availability flag of a bike, if it exists.
    pub fn is_available(&self, bike_id: BikeId) -> Option<bool> {
        self.lock().bikes.get(&bike_id).map(|b| b.available)
    }

    /// Configures the service to fail every reserve call.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.lock().fail_on_reserve = fail;
    }

    /// Configures the service to fail every free call.
    pub fn set_fail_on_free(&self, fail: bool) {
        self.lock().fail_on_free = fail;
    }

    /// Number of reserve calls received, including failed ones.
    pub fn reserve_calls(&self) -> usize {
        self.lock().reserve_calls
    }

    fn toggle(&self, bike_id: BikeId, available: bool) -> Result<()> {
        let mut state = self.lock();
        let bike = state.bikes.get_mut(&bike_id).ok_or_else(|| EngineError::Rejected {
            service: SERVICE,
            reason: format!("BikeId \"{bike_id}\" does not exist!"),
        })?;
        if bike.available == available {
            return Err(EngineError::Rejected {
                service: SERVICE,
                reason: format!("Invalid reservation request was made for BikeId {bike_id}"),
            });
        }
        bike.available = available;
        Ok(())
    }
}

#[async_trait]
impl BikeDirectory for InMemoryBikeDirectory {
    async fn reserve(&self, _ctx: &RequestContext, bike_id: BikeId) -> Result<()> {
        {
            let mut state = self.lock();
            state.reserve_calls += 1;
            if state.fail_on_reserve {
                return Err(EngineError::Unavailable {
                    service: SERVICE,
                    reason: "connection refused".to_string(),
                });
            }
        }
        self.toggle(bike_id, false)
    }

    async fn free(&self, _ctx: &RequestContext, bike_id: BikeId) -> Result<()> {
        if self.lock().fail_on_free {
            return Err(EngineError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        self.toggle(bike_id, true)
    }

    async fn get(&self, _ctx: &RequestContext, bike_id: BikeId) -> Result<Bike> {
        self.lock()
            .bikes
            .get(&bike_id)
            .cloned()
            .ok_or_else(|| EngineError::Rejected {
                service: SERVICE,
                reason: format!("BikeId \"{bike_id}\" does not exist!"),
            })
    }
}
