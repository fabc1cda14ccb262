use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A customer profile keyed by phone number. Created on first booking or
/// registration, mutated by each successful commit, never deleted.
///
/// `total_reservations` counts lifetime bookings made; cancellations do not
/// decrement it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub phone_number: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub total_reservations: i64,
    pub last_reservation_date: Option<NaiveDate>,
}
