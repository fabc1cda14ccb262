use chrono::{DateTime, Utc};
use sqlx::Row;

use maitred_core::domain::customer::Customer;

use super::{CustomerDirectory, DirectoryError, RepositoryError};
use crate::DbPool;

#[derive(Clone)]
pub struct SqlCustomerDirectory {
    pool: DbPool,
}

impl SqlCustomerDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const CUSTOMER_SELECT: &str = "SELECT phone_number, name, created_at, total_reservations, last_reservation_date
 FROM customers";

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let phone_number: String =
        row.try_get("phone_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_raw: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_reservations: i64 =
        row.try_get("total_reservations").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_reservation_date: Option<chrono::NaiveDate> =
        row.try_get("last_reservation_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Customer { phone_number, name, created_at, total_reservations, last_reservation_date })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl CustomerDirectory for SqlCustomerDirectory {
    async fn exists(&self, phone_number: &str) -> Result<bool, RepositoryError> {
        let present: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE phone_number = ?1)")
                .bind(phone_number)
                .fetch_one(&self.pool)
                .await?;
        Ok(present == 1)
    }

    async fn get(&self, phone_number: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(&format!("{CUSTOMER_SELECT} WHERE phone_number = ?1"))
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, phone_number: &str, name: &str) -> Result<Customer, DirectoryError> {
        let created_at = Utc::now();

        let inserted = sqlx::query(
            "INSERT INTO customers (phone_number, name, created_at, total_reservations)
             VALUES (?1, ?2, ?3, 0)",
        )
        .bind(phone_number)
        .bind(name)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(error) = inserted {
            if is_unique_violation(&error) {
                return Err(DirectoryError::DuplicatePhone(phone_number.to_string()));
            }
            return Err(error.into());
        }

        Ok(Customer {
            phone_number: phone_number.to_string(),
            name: name.to_string(),
            created_at,
            total_reservations: 0,
            last_reservation_date: None,
        })
    }
}
