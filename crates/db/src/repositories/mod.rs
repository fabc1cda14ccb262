use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use maitred_core::domain::customer::Customer;
use maitred_core::domain::reservation::{CommitRequest, ReservationDetails, ReservationId};
use maitred_core::domain::restaurant::{
    DiningTable, Restaurant, RestaurantFilter, RestaurantId, TableId,
};
use maitred_core::domain::slots::{SlotAssignment, SlotGrid, TimeSlot};
use maitred_core::policy::WindowViolation;

pub mod availability;
pub mod catalog;
pub mod directory;
pub mod ledger;

pub use availability::SqlAvailabilityEngine;
pub use catalog::SqlCatalogRepository;
pub use directory::SqlCustomerDirectory;
pub use ledger::{LedgerStats, SqlReservationLedger};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Rejections and failures of the booking commit path. The first three
/// variants are business rejections the caller can surface and retry after a
/// fresh availability lookup; `Storage` is infrastructure and distinct.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Window(#[from] WindowViolation),
    #[error("table {table_id} has just been booked for {date} {slot}; choose another slot")]
    SlotTaken { table_id: TableId, date: NaiveDate, slot: TimeSlot },
    #[error("restaurant {restaurant_id} has no active table {table_id}")]
    UnknownTable { restaurant_id: RestaurantId, table_id: TableId },
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl From<sqlx::Error> for CommitError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(RepositoryError::Database(error))
    }
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("reservation {0} not found or already cancelled")]
    NotFound(ReservationId),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl From<sqlx::Error> for CancelError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(RepositoryError::Database(error))
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("a customer with phone number {0} already exists")]
    DuplicatePhone(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(RepositoryError::Database(error))
    }
}

/// Read-only reference data: restaurants, their tables, the shared slot grid.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn search(&self, filter: &RestaurantFilter) -> Result<Vec<Restaurant>, RepositoryError>;

    async fn restaurant_by_id(
        &self,
        id: RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError>;

    /// Highest-rated restaurant whose name contains `name`.
    async fn restaurant_by_name(&self, name: &str)
        -> Result<Option<Restaurant>, RepositoryError>;

    /// Active tables of a restaurant, ascending by capacity. Unknown
    /// restaurants yield an empty vec, not an error.
    async fn tables_of(&self, restaurant_id: RestaurantId)
        -> Result<Vec<DiningTable>, RepositoryError>;

    async fn slot_grid(&self) -> Result<SlotGrid, RepositoryError>;
}

/// Computes which (slot, table) pairs are currently free. Reads tolerate
/// slightly stale ledger data; the commit path re-checks.
#[async_trait]
pub trait AvailabilityEngine: Send + Sync {
    async fn available_slots(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<Vec<SlotAssignment>, RepositoryError>;

    async fn nearest_slot_at_or_after(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
        requested: NaiveTime,
        party_size: u32,
    ) -> Result<Option<SlotAssignment>, RepositoryError>;
}

/// The authoritative booking record. Owns the one-confirmed-reservation-per-
/// (table, date, slot) invariant and reservation-id issuance.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn commit(&self, request: &CommitRequest) -> Result<ReservationDetails, CommitError>;

    async fn cancel(&self, id: &ReservationId) -> Result<(), CancelError>;

    /// Confirmed reservations for a phone number, most recent first.
    async fn reservations_of(
        &self,
        phone_number: &str,
        limit: u32,
    ) -> Result<Vec<ReservationDetails>, RepositoryError>;

    async fn find_by_id(
        &self,
        id: &ReservationId,
    ) -> Result<Option<ReservationDetails>, RepositoryError>;

    async fn stats(&self) -> Result<LedgerStats, RepositoryError>;
}

/// Phone-number-keyed customer profiles.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn exists(&self, phone_number: &str) -> Result<bool, RepositoryError>;

    async fn get(&self, phone_number: &str) -> Result<Option<Customer>, RepositoryError>;

    /// Creation is not idempotent: a duplicate phone number is rejected.
    async fn create(&self, phone_number: &str, name: &str) -> Result<Customer, DirectoryError>;
}
