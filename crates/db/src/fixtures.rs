use maitred_core::config::BookingConfig;
use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Canonical catalog contract: the restaurants the seed fixture provides and
/// verification checks against.
const SEED_RESTAURANTS: &[SeedRestaurantContract] = &[
    SeedRestaurantContract { id: 1, name: "Spice Garden", cuisine: "Indian", location: "Koramangala" },
    SeedRestaurantContract { id: 2, name: "Curry House", cuisine: "Indian", location: "Indiranagar" },
    SeedRestaurantContract { id: 3, name: "Maharaja Palace", cuisine: "Indian", location: "MG Road" },
    SeedRestaurantContract { id: 4, name: "Bella Italia", cuisine: "Italian", location: "Koramangala" },
    SeedRestaurantContract { id: 5, name: "Luigi's Kitchen", cuisine: "Italian", location: "Brigade Road" },
    SeedRestaurantContract { id: 6, name: "Dragon Wok", cuisine: "Chinese", location: "Koramangala" },
    SeedRestaurantContract { id: 7, name: "Golden Chopsticks", cuisine: "Chinese", location: "Commercial Street" },
    SeedRestaurantContract { id: 8, name: "The Continental", cuisine: "Continental", location: "Indiranagar" },
    SeedRestaurantContract { id: 9, name: "Taco Fiesta", cuisine: "Mexican", location: "Koramangala" },
    SeedRestaurantContract { id: 10, name: "Sakura Sushi", cuisine: "Japanese", location: "UB City" },
];

/// Three 2-seat, three 4-seat, three 6-seat tables per restaurant.
const TABLES_PER_RESTAURANT: i64 = 9;

struct SeedRestaurantContract {
    id: i64,
    name: &'static str,
    cuisine: &'static str,
    location: &'static str,
}

/// Deterministic catalog fixture: restaurants and their physical tables from
/// an embedded SQL file, plus the time-slot grid and id-counter floor derived
/// from `BookingConfig`. Safe to run more than once.
pub struct CatalogSeed;

#[derive(Debug, Clone)]
pub struct SeedResult {
    pub restaurants_seeded: usize,
    pub tables_seeded: usize,
    pub slots_seeded: usize,
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl CatalogSeed {
    /// SQL fixture content for the restaurant/table catalog.
    pub const SQL: &str = include_str!("../../../config/fixtures/catalog_seed.sql");

    pub async fn load(
        pool: &DbPool,
        booking: &BookingConfig,
    ) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;

        let grid = booking.slot_grid();
        for (order, slot) in grid.slots().iter().enumerate() {
            sqlx::query(
                "INSERT INTO time_slots (time_slot, slot_order) VALUES (?, ?)
                 ON CONFLICT(time_slot) DO NOTHING",
            )
            .bind(slot.as_hhmm())
            .bind(order as i64)
            .execute(&mut *tx)
            .await?;
        }

        // Respect a configured counter floor without ever moving the counter
        // backwards past already-issued identifiers.
        sqlx::query("UPDATE reservation_counter SET next_id = MAX(next_id, ?) WHERE id = 1")
            .bind(booking.counter_floor)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SeedResult {
            restaurants_seeded: SEED_RESTAURANTS.len(),
            tables_seeded: SEED_RESTAURANTS.len() * TABLES_PER_RESTAURANT as usize,
            slots_seeded: grid.len(),
        })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(
        pool: &DbPool,
        booking: &BookingConfig,
    ) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for restaurant in SEED_RESTAURANTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM restaurants
                     WHERE id = ?1 AND name = ?2 AND cuisine = ?3 AND location = ?4
                       AND is_active = 1
                 )",
            )
            .bind(restaurant.id)
            .bind(restaurant.name)
            .bind(restaurant.cuisine)
            .bind(restaurant.location)
            .fetch_one(pool)
            .await?;

            let table_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM tables WHERE restaurant_id = ?1")
                    .bind(restaurant.id)
                    .fetch_one(pool)
                    .await?;

            checks.push((restaurant.name, present == 1 && table_count == TABLES_PER_RESTAURANT));
        }

        let expected_slots = booking.slot_grid().len() as i64;
        let slot_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM time_slots").fetch_one(pool).await?;
        checks.push(("time-slot-grid", slot_count == expected_slots));

        let counter_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservation_counter WHERE id = 1 AND next_id >= ?1)",
        )
        .bind(booking.counter_floor)
        .fetch_one(pool)
        .await?;
        checks.push(("reservation-counter-floor", counter_ok == 1));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use maitred_core::config::AppConfig;

    use super::CatalogSeed;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_loads_and_verifies() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let booking = AppConfig::default().booking;

        let result = CatalogSeed::load(&pool, &booking).await.expect("seed");
        assert_eq!(result.restaurants_seeded, 10);
        assert_eq!(result.tables_seeded, 90);
        assert_eq!(result.slots_seeded, 25);

        let verification = CatalogSeed::verify(&pool, &booking).await.expect("verify");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let booking = AppConfig::default().booking;

        CatalogSeed::load(&pool, &booking).await.expect("first seed");
        CatalogSeed::load(&pool, &booking).await.expect("second seed");

        let restaurants: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM restaurants").fetch_one(&pool).await.expect("count");
        let tables: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM tables").fetch_one(&pool).await.expect("count");
        assert_eq!(restaurants, 10);
        assert_eq!(tables, 90);
    }
}
