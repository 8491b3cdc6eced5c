//! Reservation records and their lifecycle.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{optional_timestamp, timestamp};
use crate::types::{BikeId, RecordId, RequestId, ReservationId, UserId};
use crate::validation::{Validate, ValidationErrors};

/// The state of a reservation in its lifecycle.
///
/// State transitions:
/// ```text
/// Booking ──► Booked ──► Completing ──► Completed
///    │           │            │
///    └───────────┴────────────┴──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReservationState {
    /// Created by the gateway, bike not yet held.
    #[default]
    Booking,

    /// Bike is held for the customer.
    Booked,

    /// Return requested, bike not yet released.
    Completing,

    /// Bike released and invoiced (terminal state).
    Completed,

    /// A workflow step failed (terminal state).
    Failed,
}

impl ReservationState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationState::Completed | ReservationState::Failed)
    }

    /// Returns true if the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ReservationState) -> bool {
        use ReservationState::*;
        match (self, next) {
            (Booking, Booked) | (Booked, Completing) | (Completing, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Booking => "Booking",
            ReservationState::Booked => "Booked",
            ReservationState::Completing => "Completing",
            ReservationState::Completed => "Completed",
            ReservationState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationState {
    type Err = String;

    /// Case-insensitive, so query strings like `?state=booked` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ReservationState::Booking,
            ReservationState::Booked,
            ReservationState::Completing,
            ReservationState::Completed,
            ReservationState::Failed,
        ]
        .into_iter()
        .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown reservation state '{s}'"))
    }
}

/// A reservation as held by the Reservation Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub user_id: UserId,
    pub bike_id: BikeId,
    pub state: ReservationState,
    #[serde(with = "timestamp")]
    pub request_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    /// Empty until the reservation completes.
    #[serde(with = "optional_timestamp", default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(with = "optional_record_id", default)]
    pub invoice_id: Option<RecordId>,
    pub request_id: RequestId,
}

impl Reservation {
    /// Builds a fresh reservation in the `Booking` state.
    pub fn booking(
        user_id: UserId,
        bike_id: BikeId,
        start_time: Option<DateTime<Utc>>,
        request_id: RequestId,
    ) -> Self {
        let now = crate::time::now();
        Self {
            reservation_id: ReservationId::generate(),
            user_id,
            bike_id,
            state: ReservationState::Booking,
            request_time: now,
            start_time: start_time.unwrap_or(now),
            end_time: None,
            invoice_id: None,
            request_id,
        }
    }

    /// Applies a state update, returning true if any field changed.
    pub fn apply(&mut self, update: &StateUpdate) -> bool {
        let invoice_id = update.invoice_id.or(self.invoice_id);
        let changed = self.state != update.state
            || self.end_time != update.end_time
            || self.invoice_id != invoice_id;
        self.state = update.state;
        self.end_time = update.end_time;
        self.invoice_id = invoice_id;
        changed
    }
}

impl Validate for Reservation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("reservationId", self.reservation_id.as_str());
        errors.require_non_empty("userId", self.user_id.as_str());
        if self.end_time.is_some_and(|end| end < self.start_time) {
            errors.push("endTime", "must not be before startTime");
        }
        errors.into_result()
    }
}

/// Rewrite of a reservation's mutable fields.
///
/// An absent `invoiceId` leaves the stored one untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    pub state: ReservationState,
    #[serde(with = "optional_timestamp", default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<RecordId>,
}

impl StateUpdate {
    pub fn new(state: ReservationState, end_time: Option<DateTime<Utc>>) -> Self {
        Self {
            state,
            end_time,
            invoice_id: None,
        }
    }

    pub fn with_invoice(mut self, invoice_id: RecordId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }
}

/// Outcome of a conditional update, in document-store terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn is_modified(&self) -> bool {
        self.modified_count > 0
    }
}

/// Serde adapter for an optional record id written as `""` when absent.
pub mod optional_record_id {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::RecordId;

    pub fn serialize<S: Serializer>(
        id: &Option<RecordId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.collect_str(id),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RecordId>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
