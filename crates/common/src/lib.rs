//! Shared wire model for the bike-sharing services.
//!
//! Every service speaks camelCase JSON; the types here are the single
//! definition of those payloads, together with the identifiers and
//! timestamp format they use.

pub mod bike;
pub mod billing;
pub mod reservation;
pub mod time;
pub mod types;
pub mod user;
pub mod validation;

pub use bike::{Bike, BikeType, BikeUpdate, NewBike};
pub use billing::{
    CustomerProfile, Invoice, NewCustomerProfile, NewInvoice, NewVendorProfile, VendorProfile,
};
pub use reservation::{Reservation, ReservationState, StateUpdate, UpdateResult};
pub use types::{BikeId, RecordId, RequestId, ReservationId, UserId};
pub use user::{User, UserPatch, UserType, UserUpdate};
pub use validation::{FieldError, Validate, ValidationErrors};
