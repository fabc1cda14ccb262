use sqlx::Row;

use maitred_core::domain::restaurant::{
    DiningTable, Restaurant, RestaurantFilter, RestaurantId, TableId,
};
use maitred_core::domain::slots::{SlotGrid, TimeSlot};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone)]
pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const RESTAURANT_SELECT: &str = "SELECT id, name, cuisine, location, city, address, phone,
        rating, price_range, description
 FROM restaurants";

fn row_to_restaurant(row: &sqlx::sqlite::SqliteRow) -> Result<Restaurant, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let cuisine: String =
        row.try_get("cuisine").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let location: String =
        row.try_get("location").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let city: String = row.try_get("city").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let address: Option<String> =
        row.try_get("address").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rating: f64 =
        row.try_get("rating").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_range: Option<String> =
        row.try_get("price_range").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Restaurant {
        id: RestaurantId(id),
        name,
        cuisine,
        location,
        city,
        address,
        phone,
        rating,
        price_range,
        description,
    })
}

fn row_to_table(row: &sqlx::sqlite::SqliteRow) -> Result<DiningTable, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let restaurant_id: i64 =
        row.try_get("restaurant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let table_number: i64 =
        row.try_get("table_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let capacity: i64 =
        row.try_get("capacity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(DiningTable {
        id: TableId(id),
        restaurant_id: RestaurantId(restaurant_id),
        table_number: u32::try_from(table_number)
            .map_err(|_| RepositoryError::Decode(format!("negative table number {table_number}")))?,
        capacity: u32::try_from(capacity)
            .map_err(|_| RepositoryError::Decode(format!("negative capacity {capacity}")))?,
    })
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn search(&self, filter: &RestaurantFilter) -> Result<Vec<Restaurant>, RepositoryError> {
        let mut sql = format!("{RESTAURANT_SELECT} WHERE is_active = 1");
        let mut binds = Vec::new();

        if let Some(cuisine) = &filter.cuisine {
            sql.push_str(" AND cuisine LIKE ?");
            binds.push(format!("%{cuisine}%"));
        }
        if let Some(location) = &filter.location {
            sql.push_str(" AND location LIKE ?");
            binds.push(format!("%{location}%"));
        }
        if let Some(name) = &filter.name {
            sql.push_str(" AND name LIKE ?");
            binds.push(format!("%{name}%"));
        }
        sql.push_str(" ORDER BY rating DESC, name ASC");

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_restaurant).collect()
    }

    async fn restaurant_by_id(
        &self,
        id: RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query(&format!("{RESTAURANT_SELECT} WHERE id = ? AND is_active = 1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_restaurant(r)?)),
            None => Ok(None),
        }
    }

    async fn restaurant_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{RESTAURANT_SELECT} WHERE name LIKE ? AND is_active = 1
             ORDER BY rating DESC LIMIT 1"
        ))
        .bind(format!("%{name}%"))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_restaurant(r)?)),
            None => Ok(None),
        }
    }

    async fn tables_of(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<DiningTable>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, restaurant_id, table_number, capacity
             FROM tables
             WHERE restaurant_id = ? AND is_active = 1
             ORDER BY capacity ASC, id ASC",
        )
        .bind(restaurant_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_table).collect()
    }

    async fn slot_grid(&self) -> Result<SlotGrid, RepositoryError> {
        let rows = sqlx::query("SELECT time_slot FROM time_slots ORDER BY slot_order ASC")
            .fetch_all(&self.pool)
            .await?;

        let slots = rows
            .iter()
            .map(|row| {
                let raw: String =
                    row.try_get("time_slot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                TimeSlot::parse(&raw).map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SlotGrid::new(slots))
    }
}

#[cfg(test)]
mod tests {
    use maitred_core::config::AppConfig;
    use maitred_core::domain::restaurant::{RestaurantFilter, RestaurantId};

    use super::SqlCatalogRepository;
    use crate::fixtures::CatalogSeed;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        CatalogSeed::load(&pool, &AppConfig::default().booking).await.expect("seed");
        pool
    }

    #[tokio::test]
    async fn search_orders_by_rating_descending() {
        let pool = setup().await;
        let catalog = SqlCatalogRepository::new(pool);

        let indian = catalog.search(&RestaurantFilter::by_cuisine("Indian")).await.expect("search");
        assert_eq!(indian.len(), 3);
        assert_eq!(indian[0].name, "Maharaja Palace");
        assert!(indian.windows(2).all(|pair| pair[0].rating >= pair[1].rating));
    }

    #[tokio::test]
    async fn search_combines_filters() {
        let pool = setup().await;
        let catalog = SqlCatalogRepository::new(pool);

        let filter = RestaurantFilter {
            cuisine: Some("Italian".to_string()),
            location: Some("Koramangala".to_string()),
            name: None,
        };
        let results = catalog.search(&filter).await.expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Bella Italia");
    }

    #[tokio::test]
    async fn by_name_returns_highest_rated_partial_match() {
        let pool = setup().await;
        let catalog = SqlCatalogRepository::new(pool);

        let found = catalog.restaurant_by_name("Garden").await.expect("lookup");
        assert_eq!(found.expect("present").name, "Spice Garden");

        let missing = catalog.restaurant_by_name("Nonexistent Bistro").await.expect("lookup");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn tables_sorted_by_ascending_capacity() {
        let pool = setup().await;
        let catalog = SqlCatalogRepository::new(pool);

        let tables = catalog.tables_of(RestaurantId(1)).await.expect("tables");
        assert_eq!(tables.len(), 9);
        let capacities: Vec<u32> = tables.iter().map(|t| t.capacity).collect();
        assert_eq!(capacities, vec![2, 2, 2, 4, 4, 4, 6, 6, 6]);
    }

    #[tokio::test]
    async fn unknown_restaurant_yields_empty_results() {
        let pool = setup().await;
        let catalog = SqlCatalogRepository::new(pool);

        assert!(catalog.restaurant_by_id(RestaurantId(999)).await.expect("lookup").is_none());
        assert!(catalog.tables_of(RestaurantId(999)).await.expect("tables").is_empty());
    }

    #[tokio::test]
    async fn slot_grid_round_trips_from_store() {
        let pool = setup().await;
        let catalog = SqlCatalogRepository::new(pool);

        let grid = catalog.slot_grid().await.expect("grid");
        assert_eq!(grid.len(), 25);
        assert_eq!(grid.slots()[0].as_hhmm(), "11:00");
        assert_eq!(grid.slots()[24].as_hhmm(), "23:00");
    }
}
