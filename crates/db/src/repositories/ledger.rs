use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use sqlx::{Row, SqliteConnection};

use maitred_core::config::BookingConfig;
use maitred_core::domain::reservation::{
    CommitRequest, Reservation, ReservationDetails, ReservationId, ReservationStatus,
};
use maitred_core::domain::restaurant::{RestaurantId, TableId};
use maitred_core::domain::slots::TimeSlot;
use maitred_core::policy::BookingWindow;

use super::{CancelError, CommitError, RepositoryError, ReservationLedger};
use crate::DbPool;

/// The authoritative booking record. All writes funnel through one
/// transaction shape so the no-double-booking invariant holds under
/// arbitrary interleaving of commits from independent conversations.
#[derive(Clone)]
pub struct SqlReservationLedger {
    pool: DbPool,
    window: BookingWindow,
    id_prefix: String,
}

impl SqlReservationLedger {
    pub fn new(pool: DbPool, booking: &BookingConfig) -> Self {
        Self {
            pool,
            window: booking.window(),
            id_prefix: booking.reservation_prefix.clone(),
        }
    }
}

/// Aggregate counts over the whole store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub restaurants: i64,
    pub customers: i64,
    pub confirmed_reservations: i64,
    pub total_reservations: i64,
    pub tables: i64,
}

const DETAILS_SELECT: &str = "SELECT r.reservation_id, r.restaurant_id, r.table_id, r.phone_number, r.customer_name,
        r.date, r.time_slot, r.party_size, r.status, r.created_at, r.updated_at,
        rest.name AS restaurant_name, rest.location AS restaurant_location,
        t.table_number, t.capacity AS table_capacity
 FROM reservations r
 JOIN restaurants rest ON rest.id = r.restaurant_id
 JOIN tables t ON t.id = r.table_id";

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

fn row_to_details(row: &sqlx::sqlite::SqliteRow) -> Result<ReservationDetails, RepositoryError> {
    let reservation_id: String =
        row.try_get("reservation_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let restaurant_id: i64 =
        row.try_get("restaurant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let table_id: i64 =
        row.try_get("table_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone_number: String =
        row.try_get("phone_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_name: String =
        row.try_get("customer_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let date: chrono::NaiveDate =
        row.try_get("date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let slot_raw: String =
        row.try_get("time_slot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let party_size: i64 =
        row.try_get("party_size").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_raw: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_raw: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_raw: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let restaurant_name: String =
        row.try_get("restaurant_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let restaurant_location: String =
        row.try_get("restaurant_location").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let table_number: i64 =
        row.try_get("table_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let table_capacity: i64 =
        row.try_get("table_capacity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let slot = TimeSlot::parse(&slot_raw).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    // An unknown status would silently weaken the invariant filter, so it is
    // a decode error rather than a lenient default.
    let status = ReservationStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown reservation status `{status_raw}`")))?;

    Ok(ReservationDetails {
        reservation: Reservation {
            id: ReservationId(reservation_id),
            restaurant_id: RestaurantId(restaurant_id),
            table_id: TableId(table_id),
            phone_number,
            customer_name,
            date,
            slot,
            party_size: u32::try_from(party_size)
                .map_err(|_| RepositoryError::Decode(format!("negative party size {party_size}")))?,
            status,
            created_at: parse_timestamp(&created_at_raw),
            updated_at: parse_timestamp(&updated_at_raw),
        },
        restaurant_name,
        restaurant_location,
        table_number: u32::try_from(table_number)
            .map_err(|_| RepositoryError::Decode(format!("negative table number {table_number}")))?,
        table_capacity: u32::try_from(table_capacity)
            .map_err(|_| RepositoryError::Decode(format!("negative capacity {table_capacity}")))?,
    })
}

async fn fetch_details(
    conn: &mut SqliteConnection,
    reservation_id: &str,
) -> Result<Option<ReservationDetails>, RepositoryError> {
    let row = sqlx::query(&format!("{DETAILS_SELECT} WHERE r.reservation_id = ?"))
        .bind(reservation_id)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(ref r) => Ok(Some(row_to_details(r)?)),
        None => Ok(None),
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ReservationLedger for SqlReservationLedger {
    async fn commit(&self, request: &CommitRequest) -> Result<ReservationDetails, CommitError> {
        let today = Local::now().date_naive();
        // Re-validate here rather than trusting the caller's earlier check;
        // time may have passed since the availability lookup.
        self.window.validate(request.date, today)?;

        let mut tx = self.pool.begin().await?;

        // The counter update comes first: the transaction's opening write
        // takes the database write lock, so the slot re-check and insert
        // below are serialized against rival commits instead of racing on a
        // stale read snapshot.
        let counter: i64 = sqlx::query_scalar(
            "UPDATE reservation_counter SET next_id = next_id + 1 WHERE id = 1
             RETURNING next_id - 1",
        )
        .fetch_one(&mut *tx)
        .await?;
        let reservation_id = ReservationId::from_counter(&self.id_prefix, counter);

        let table_exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM tables
                 WHERE id = ?1 AND restaurant_id = ?2 AND is_active = 1
             )",
        )
        .bind(request.table_id.0)
        .bind(request.restaurant_id.0)
        .fetch_one(&mut *tx)
        .await?;
        if table_exists == 0 {
            return Err(CommitError::UnknownTable {
                restaurant_id: request.restaurant_id,
                table_id: request.table_id,
            });
        }

        let already_taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM reservations
             WHERE table_id = ?1 AND date = ?2 AND time_slot = ?3 AND status = 'confirmed'",
        )
        .bind(request.table_id.0)
        .bind(request.date)
        .bind(request.slot.as_hhmm())
        .fetch_one(&mut *tx)
        .await?;
        if already_taken > 0 {
            return Err(CommitError::SlotTaken {
                table_id: request.table_id,
                date: request.date,
                slot: request.slot,
            });
        }

        let now = Utc::now().to_rfc3339();

        // Upsert before the reservation insert so the phone-number foreign
        // key holds. The counter records lifetime bookings made and is never
        // decremented by cancellation.
        sqlx::query(
            "INSERT INTO customers (phone_number, name, created_at, total_reservations, last_reservation_date)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(phone_number) DO UPDATE SET
                 total_reservations = total_reservations + 1,
                 last_reservation_date = excluded.last_reservation_date",
        )
        .bind(&request.phone_number)
        .bind(&request.customer_name)
        .bind(&now)
        .bind(request.date)
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            "INSERT INTO reservations
                 (reservation_id, restaurant_id, table_id, phone_number, customer_name,
                  date, time_slot, party_size, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'confirmed', ?9, ?10)",
        )
        .bind(&reservation_id.0)
        .bind(request.restaurant_id.0)
        .bind(request.table_id.0)
        .bind(&request.phone_number)
        .bind(&request.customer_name)
        .bind(request.date)
        .bind(request.slot.as_hhmm())
        .bind(i64::from(request.party_size))
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        if let Err(error) = inserted {
            // The partial unique index is the backstop for a race that got
            // past the re-check above.
            if is_unique_violation(&error) {
                return Err(CommitError::SlotTaken {
                    table_id: request.table_id,
                    date: request.date,
                    slot: request.slot,
                });
            }
            return Err(error.into());
        }

        let details = fetch_details(&mut *tx, &reservation_id.0)
            .await
            .map_err(CommitError::Storage)?
            .ok_or_else(|| {
                CommitError::Storage(RepositoryError::Decode(format!(
                    "committed reservation {reservation_id} not readable back"
                )))
            })?;

        tx.commit().await?;

        tracing::info!(
            event_name = "ledger.reservation.committed",
            reservation_id = %details.reservation.id,
            restaurant_id = %details.reservation.restaurant_id,
            table_id = %details.reservation.table_id,
            date = %details.reservation.date,
            slot = %details.reservation.slot,
            "reservation confirmed"
        );

        Ok(details)
    }

    async fn cancel(&self, id: &ReservationId) -> Result<(), CancelError> {
        let result = sqlx::query(
            "UPDATE reservations
             SET status = 'cancelled', updated_at = ?1
             WHERE reservation_id = ?2 AND status = 'confirmed'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CancelError::NotFound(id.clone()));
        }

        tracing::info!(
            event_name = "ledger.reservation.cancelled",
            reservation_id = %id,
            "reservation cancelled"
        );

        Ok(())
    }

    async fn reservations_of(
        &self,
        phone_number: &str,
        limit: u32,
    ) -> Result<Vec<ReservationDetails>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{DETAILS_SELECT}
             WHERE r.phone_number = ?1 AND r.status = 'confirmed'
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?2"
        ))
        .bind(phone_number)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_details).collect()
    }

    async fn find_by_id(
        &self,
        id: &ReservationId,
    ) -> Result<Option<ReservationDetails>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_details(&mut *conn, &id.0).await
    }

    async fn stats(&self) -> Result<LedgerStats, RepositoryError> {
        let restaurants: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM restaurants WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        let customers: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM customers").fetch_one(&self.pool).await?;
        let confirmed_reservations: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM reservations WHERE status = 'confirmed'")
                .fetch_one(&self.pool)
                .await?;
        let total_reservations: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM reservations").fetch_one(&self.pool).await?;
        let tables: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM tables").fetch_one(&self.pool).await?;

        Ok(LedgerStats {
            restaurants,
            customers,
            confirmed_reservations,
            total_reservations,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local};
    use maitred_core::config::AppConfig;
    use maitred_core::domain::reservation::{CommitRequest, ReservationId, ReservationStatus};
    use maitred_core::domain::restaurant::{RestaurantId, TableId};
    use maitred_core::domain::slots::TimeSlot;
    use maitred_core::policy::WindowViolation;

    use super::SqlReservationLedger;
    use crate::fixtures::CatalogSeed;
    use crate::repositories::{
        CancelError, CommitError, CustomerDirectory, ReservationLedger, SqlCustomerDirectory,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        CatalogSeed::load(&pool, &AppConfig::default().booking).await.expect("seed");
        pool
    }

    fn ledger(pool: &sqlx::SqlitePool) -> SqlReservationLedger {
        SqlReservationLedger::new(pool.clone(), &AppConfig::default().booking)
    }

    fn request(table_id: i64, slot: &str, phone: &str) -> CommitRequest {
        CommitRequest {
            restaurant_id: RestaurantId(1),
            table_id: TableId(table_id),
            phone_number: phone.to_string(),
            customer_name: "Priya Sharma".to_string(),
            date: Local::now().date_naive(),
            slot: TimeSlot::parse(slot).expect("test slot"),
            party_size: 4,
        }
    }

    #[tokio::test]
    async fn commit_returns_hydrated_reservation_with_first_counter_id() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let details = ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");

        assert_eq!(details.reservation.id, ReservationId("TT1000".to_string()));
        assert_eq!(details.reservation.status, ReservationStatus::Confirmed);
        assert_eq!(details.restaurant_name, "Spice Garden");
        assert_eq!(details.restaurant_location, "Koramangala");
        assert_eq!(details.table_capacity, 4);
        assert_eq!(details.reservation.slot.as_hhmm(), "19:00");
    }

    #[tokio::test]
    async fn second_commit_on_same_key_is_rejected() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        ledger.commit(&request(4, "19:00", "9880012345")).await.expect("first commit");
        let error = ledger
            .commit(&request(4, "19:00", "9880099999"))
            .await
            .expect_err("same key must be rejected");

        assert!(matches!(error, CommitError::SlotTaken { .. }));
    }

    #[tokio::test]
    async fn identifiers_are_distinct_and_non_decreasing() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let mut counters = Vec::new();
        for slot in ["18:00", "18:30", "19:00"] {
            let details = ledger.commit(&request(4, slot, "9880012345")).await.expect("commit");
            counters.push(details.reservation.id.counter_value("TT").expect("counter id"));
        }

        assert!(counters.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn window_is_revalidated_at_commit() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let mut beyond = request(4, "19:00", "9880012345");
        beyond.date = Local::now().date_naive() + Duration::days(4);
        let error = ledger.commit(&beyond).await.expect_err("beyond horizon");
        assert!(matches!(
            error,
            CommitError::Window(WindowViolation::BeyondHorizon { horizon_days: 3, days_ahead: 4 })
        ));

        let mut past = request(4, "19:30", "9880012345");
        past.date = Local::now().date_naive() - Duration::days(1);
        let error = ledger.commit(&past).await.expect_err("past date");
        assert!(matches!(error, CommitError::Window(WindowViolation::PastDate)));

        let mut at_horizon = request(4, "20:00", "9880012345");
        at_horizon.date = Local::now().date_naive() + Duration::days(3);
        ledger.commit(&at_horizon).await.expect("horizon boundary is bookable");
    }

    #[tokio::test]
    async fn table_must_belong_to_the_restaurant() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        // Table 10 exists but belongs to restaurant 2.
        let mut foreign = request(10, "19:00", "9880012345");
        let error = ledger.commit(&foreign).await.expect_err("foreign table");
        assert!(matches!(error, CommitError::UnknownTable { .. }));

        foreign.table_id = TableId(9999);
        let error = ledger.commit(&foreign).await.expect_err("missing table");
        assert!(matches!(error, CommitError::UnknownTable { .. }));
    }

    #[tokio::test]
    async fn cancel_is_guarded_and_terminal() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let details = ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");
        let id = details.reservation.id.clone();

        ledger.cancel(&id).await.expect("cancel");
        let error = ledger.cancel(&id).await.expect_err("already cancelled");
        assert!(matches!(error, CancelError::NotFound(_)));

        let error = ledger
            .cancel(&ReservationId("TT9999".to_string()))
            .await
            .expect_err("unknown id");
        assert!(matches!(error, CancelError::NotFound(_)));
    }

    #[tokio::test]
    async fn cancel_frees_the_key_for_rebooking() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let first = ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");
        ledger.cancel(&first.reservation.id).await.expect("cancel");

        let second =
            ledger.commit(&request(4, "19:00", "9880099999")).await.expect("rebook freed key");
        assert_ne!(second.reservation.id, first.reservation.id);
    }

    #[tokio::test]
    async fn recent_reservations_are_confirmed_only_most_recent_first() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let first = ledger.commit(&request(4, "18:00", "9880012345")).await.expect("commit");
        let second = ledger.commit(&request(4, "18:30", "9880012345")).await.expect("commit");
        let third = ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");
        ledger.cancel(&second.reservation.id).await.expect("cancel");

        let recent = ledger.reservations_of("9880012345", 5).await.expect("list");
        let ids: Vec<_> = recent.iter().map(|d| d.reservation.id.clone()).collect();
        assert_eq!(ids, vec![third.reservation.id, first.reservation.id]);
    }

    #[tokio::test]
    async fn find_by_id_hydrates_or_yields_none() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let details = ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");
        let found =
            ledger.find_by_id(&details.reservation.id).await.expect("lookup").expect("present");
        assert_eq!(found.restaurant_name, "Spice Garden");

        let missing =
            ledger.find_by_id(&ReservationId("TT4242".to_string())).await.expect("lookup");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn commit_upserts_the_customer_directory() {
        let pool = setup().await;
        let ledger = ledger(&pool);
        let directory = SqlCustomerDirectory::new(pool.clone());

        ledger.commit(&request(4, "18:00", "9880012345")).await.expect("commit");
        ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");
        ledger.cancel(
            &ledger.commit(&request(4, "20:00", "9880012345")).await.expect("commit").reservation.id,
        )
        .await
        .expect("cancel");

        let customer =
            directory.get("9880012345").await.expect("lookup").expect("created by commit");
        // Lifetime bookings made: cancellation does not decrement.
        assert_eq!(customer.total_reservations, 3);
        assert_eq!(customer.last_reservation_date, Some(Local::now().date_naive()));
    }

    #[tokio::test]
    async fn stats_reflect_ledger_contents() {
        let pool = setup().await;
        let ledger = ledger(&pool);

        let details = ledger.commit(&request(4, "19:00", "9880012345")).await.expect("commit");
        ledger.commit(&request(5, "19:00", "9880099999")).await.expect("commit");
        ledger.cancel(&details.reservation.id).await.expect("cancel");

        let stats = ledger.stats().await.expect("stats");
        assert_eq!(stats.restaurants, 10);
        assert_eq!(stats.tables, 90);
        assert_eq!(stats.customers, 2);
        assert_eq!(stats.confirmed_reservations, 1);
        assert_eq!(stats.total_reservations, 2);
    }
}
