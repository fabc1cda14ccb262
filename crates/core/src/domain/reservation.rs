use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::restaurant::{RestaurantId, TableId};
use crate::domain::slots::TimeSlot;

/// Public booking reference shown verbatim to end users: a fixed alphabetic
/// prefix followed by the value drawn from the global counter, e.g. `TT1024`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn from_counter(prefix: &str, counter: i64) -> Self {
        Self(format!("{prefix}{counter}"))
    }

    /// Numeric counter portion, if the id carries the given prefix.
    pub fn counter_value(&self, prefix: &str) -> Option<i64> {
        self.0.strip_prefix(prefix)?.parse().ok()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reservation lifecycle. Rows are created `confirmed` (commit is
/// all-or-nothing, there is no pending state) and the only transition is
/// `confirmed -> cancelled`; cancelled is terminal. Rows are never deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!((self, next), (Self::Confirmed, Self::Cancelled))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub restaurant_id: RestaurantId,
    pub table_id: TableId,
    pub phone_number: String,
    /// Customer name as it was at booking time.
    pub customer_name: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub party_size: u32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reservation joined with the restaurant/table display fields callers
/// need to render a confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub restaurant_name: String,
    pub restaurant_location: String,
    pub table_number: u32,
    pub table_capacity: u32,
}

/// Everything the ledger needs to turn a proposed booking into a confirmed
/// reservation.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitRequest {
    pub restaurant_id: RestaurantId,
    pub table_id: TableId,
    pub phone_number: String,
    pub customer_name: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub party_size: u32,
}

#[cfg(test)]
mod tests {
    use super::{ReservationId, ReservationStatus};

    #[test]
    fn id_formats_prefix_and_counter() {
        let id = ReservationId::from_counter("TT", 1000);
        assert_eq!(id.0, "TT1000");
        assert_eq!(id.counter_value("TT"), Some(1000));
        assert_eq!(id.counter_value("RX"), None);
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(ReservationStatus::Confirmed.can_transition_to(ReservationStatus::Cancelled));
        assert!(!ReservationStatus::Cancelled.can_transition_to(ReservationStatus::Confirmed));
        assert!(!ReservationStatus::Cancelled.can_transition_to(ReservationStatus::Cancelled));
    }

    #[test]
    fn status_round_trips_storage_form() {
        assert_eq!(ReservationStatus::parse("confirmed"), Some(ReservationStatus::Confirmed));
        assert_eq!(ReservationStatus::parse("cancelled"), Some(ReservationStatus::Cancelled));
        assert_eq!(ReservationStatus::parse("pending"), None);
    }
}
