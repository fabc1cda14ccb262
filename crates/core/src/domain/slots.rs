use std::fmt;

use chrono::{Duration, NaiveTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::domain::restaurant::TableId;

/// One bookable time-of-day value from the shared daily grid.
///
/// Serialized everywhere (storage, JSON output) in its wire form `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid time slot `{input}` (expected HH:MM)")]
pub struct ParseSlotError {
    pub input: String,
}

impl TimeSlot {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    pub fn parse(input: &str) -> Result<Self, ParseSlotError> {
        NaiveTime::parse_from_str(input.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| ParseSlotError { input: input.to_string() })
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn as_hhmm(&self) -> String {
        self.0.format("%H:%M").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hhmm())
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}

/// The ordered, finite sequence of bookable slots shared by all restaurants.
///
/// Position in the sequence, not string sorting, defines "nearest slot at or
/// after" and "next N slots".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotGrid {
    slots: Vec<TimeSlot>,
}

impl SlotGrid {
    /// Builds a grid from already-ordered slots, normalizing order and
    /// dropping duplicates so positional queries stay well-defined.
    pub fn new(mut slots: Vec<TimeSlot>) -> Self {
        slots.sort();
        slots.dedup();
        Self { slots }
    }

    /// Generates the fixed daily grid: every `interval_minutes` from `first`
    /// through `last` inclusive.
    pub fn generate(first: NaiveTime, last: NaiveTime, interval_minutes: u32) -> Self {
        let step = Duration::minutes(i64::from(interval_minutes.max(1)));
        let mut slots = Vec::new();
        let mut current = first;
        while current <= last {
            slots.push(TimeSlot(current));
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 || next <= current {
                break;
            }
            current = next;
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn position_of(&self, slot: TimeSlot) -> Option<usize> {
        self.slots.binary_search(&slot).ok()
    }

    /// First grid slot at or after `time`, with its position. `None` when the
    /// requested time is past the last slot of the day; the grid never wraps
    /// into the next day.
    pub fn first_at_or_after(&self, time: NaiveTime) -> Option<(usize, TimeSlot)> {
        let position = self.slots.partition_point(|slot| slot.time() < time);
        self.slots.get(position).map(|slot| (position, *slot))
    }
}

/// One availability answer: this slot is bookable, and this is the table that
/// would be used (the smallest free table that fits the party).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot: TimeSlot,
    pub table_id: TableId,
    pub table_number: u32,
    pub table_capacity: u32,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::{SlotGrid, TimeSlot};

    fn t(hhmm: &str) -> NaiveTime {
        NaiveTime::parse_from_str(hhmm, "%H:%M").expect("test time")
    }

    fn dinner_grid() -> SlotGrid {
        SlotGrid::generate(t("11:00"), t("23:00"), 30)
    }

    #[test]
    fn generates_half_hour_grid_inclusive_of_bounds() {
        let grid = dinner_grid();
        assert_eq!(grid.len(), 25);
        assert_eq!(grid.slots()[0].as_hhmm(), "11:00");
        assert_eq!(grid.slots()[24].as_hhmm(), "23:00");
    }

    #[test]
    fn position_follows_sequence_order() {
        let grid = dinner_grid();
        assert_eq!(grid.position_of(TimeSlot::new(t("19:00"))), Some(16));
        assert_eq!(grid.position_of(TimeSlot::new(t("19:15"))), None);
    }

    #[test]
    fn first_at_or_after_prefers_exact_match() {
        let grid = dinner_grid();
        let (position, slot) = grid.first_at_or_after(t("19:00")).expect("in grid");
        assert_eq!(position, 16);
        assert_eq!(slot.as_hhmm(), "19:00");
    }

    #[test]
    fn first_at_or_after_rounds_up_between_slots() {
        let grid = dinner_grid();
        let (_, slot) = grid.first_at_or_after(t("19:10")).expect("in grid");
        assert_eq!(slot.as_hhmm(), "19:30");
    }

    #[test]
    fn no_wraparound_past_last_slot() {
        let grid = dinner_grid();
        assert_eq!(grid.first_at_or_after(t("23:15")), None);
    }

    #[test]
    fn parse_rejects_non_wire_format() {
        assert!(TimeSlot::parse("19:00").is_ok());
        assert!(TimeSlot::parse("7pm").is_err());
        assert!(TimeSlot::parse("25:00").is_err());
    }
}
