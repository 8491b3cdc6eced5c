//! Collaborator traits with HTTP and in-memory implementations.

pub mod bikes;
pub mod billing;
pub mod reservations;

pub use bikes::{BikeDirectory, HttpBikeDirectory, InMemoryBikeDirectory};
pub use billing::{BillingService, HttpBillingService, InMemoryBillingService};
pub use reservations::{HttpReservationStore, InMemoryReservationStore, ReservationStore};
