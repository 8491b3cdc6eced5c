//! Rental pricing.

use chrono::{DateTime, Utc};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Amount owed for a rental: started hours rounded up, times the hourly cost.
///
/// Returns 0 when `end` is not after `start`.
pub fn rental_amount(start: DateTime<Utc>, end: DateTime<Utc>, hourly_cost: f64) -> f64 {
    if end <= start {
        return 0.0;
    }
    let hours = ((end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR).ceil();
    hours * hourly_cost
}
