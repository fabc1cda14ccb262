use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use sqlx::Row;

use maitred_core::domain::restaurant::{RestaurantId, TableId};
use maitred_core::domain::slots::{SlotAssignment, TimeSlot};

use super::{AvailabilityEngine, RepositoryError};
use crate::DbPool;

/// Availability reads over the catalog and the live ledger. Never blocks
/// writers; a slot reported free here may still lose the race at commit
/// time, which is why the ledger re-checks.
#[derive(Clone)]
pub struct SqlAvailabilityEngine {
    pool: DbPool,
}

impl SqlAvailabilityEngine {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

struct CandidateTable {
    id: i64,
    table_number: u32,
    capacity: u32,
}

#[async_trait::async_trait]
impl AvailabilityEngine for SqlAvailabilityEngine {
    async fn available_slots(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<Vec<SlotAssignment>, RepositoryError> {
        // Tables that can seat the party, smallest first: first-fit keeps
        // large tables free for large parties.
        let table_rows = sqlx::query(
            "SELECT id, table_number, capacity
             FROM tables
             WHERE restaurant_id = ? AND capacity >= ? AND is_active = 1
             ORDER BY capacity ASC, id ASC",
        )
        .bind(restaurant_id.0)
        .bind(i64::from(party_size))
        .fetch_all(&self.pool)
        .await?;

        let candidates = table_rows
            .iter()
            .map(|row| {
                let id: i64 =
                    row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let table_number: i64 = row
                    .try_get("table_number")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let capacity: i64 =
                    row.try_get("capacity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(CandidateTable {
                    id,
                    table_number: u32::try_from(table_number).map_err(|_| {
                        RepositoryError::Decode(format!("negative table number {table_number}"))
                    })?,
                    capacity: u32::try_from(capacity).map_err(|_| {
                        RepositoryError::Decode(format!("negative capacity {capacity}"))
                    })?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let slot_rows = sqlx::query("SELECT time_slot FROM time_slots ORDER BY slot_order ASC")
            .fetch_all(&self.pool)
            .await?;

        let booked_rows = sqlx::query(
            "SELECT time_slot, table_id
             FROM reservations
             WHERE restaurant_id = ? AND date = ? AND status = 'confirmed'",
        )
        .bind(restaurant_id.0)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let mut booked: HashMap<String, HashSet<i64>> = HashMap::new();
        for row in &booked_rows {
            let slot: String =
                row.try_get("time_slot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let table_id: i64 =
                row.try_get("table_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            booked.entry(slot).or_default().insert(table_id);
        }

        let mut assignments = Vec::new();
        for row in &slot_rows {
            let raw: String =
                row.try_get("time_slot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let slot = TimeSlot::parse(&raw).map_err(|e| RepositoryError::Decode(e.to_string()))?;

            let taken = booked.get(&raw);
            let free = candidates
                .iter()
                .find(|table| !taken.map(|ids| ids.contains(&table.id)).unwrap_or(false));

            // At most one assignment per slot: the smallest free table.
            if let Some(table) = free {
                assignments.push(SlotAssignment {
                    slot,
                    table_id: TableId(table.id),
                    table_number: table.table_number,
                    table_capacity: table.capacity,
                });
            }
        }

        Ok(assignments)
    }

    async fn nearest_slot_at_or_after(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
        requested: NaiveTime,
        party_size: u32,
    ) -> Result<Option<SlotAssignment>, RepositoryError> {
        let assignments = self.available_slots(restaurant_id, date, party_size).await?;
        // No wraparound: a request past the last slot of the day yields None.
        Ok(assignments.into_iter().find(|assignment| assignment.slot.time() >= requested))
    }
}
