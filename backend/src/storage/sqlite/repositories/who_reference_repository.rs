use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

use crate::domain::models::baby::Gender;
use crate::domain::models::who_reference::{NewWhoReference, WhoReference};
use crate::storage::sqlite::connection::{format_timestamp, now_timestamp, parse_timestamp, DbConnection};
use crate::storage::traits::{StorageError, WhoReferenceStorage};

const REFERENCE_COLUMNS: &str =
    "id, gender, month_age, height_median_cm, weight_median_kg, created_at, updated_at";

/// SQLite-backed repository for the WHO median table
#[derive(Clone)]
pub struct WhoReferenceRepository {
    db: DbConnection,
}

impl WhoReferenceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_reference(row: &SqliteRow) -> Result<WhoReference> {
        let gender: String = row.get("gender");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(WhoReference {
            id: row.get("id"),
            gender: gender.parse()?,
            month_age: row.get("month_age"),
            height_median_cm: row.get("height_median_cm"),
            weight_median_kg: row.get("weight_median_kg"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn map_unique_violation(err: sqlx::Error, gender: Gender, month_age: i64) -> anyhow::Error {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StorageError::DuplicateReference { gender, month_age }.into()
        }
        other => other.into(),
    }
}

#[async_trait]
impl WhoReferenceStorage for WhoReferenceRepository {
    async fn store_reference(&self, reference: &NewWhoReference) -> Result<WhoReference> {
        let now = now_timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO who_data (gender, month_age, height_median_cm, weight_median_kg, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reference.gender.as_str())
        .bind(reference.month_age)
        .bind(reference.height_median_cm)
        .bind(reference.weight_median_kg)
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, reference.gender, reference.month_age))?;

        let id = result.last_insert_rowid();
        info!(
            "Stored WHO reference {} for {} at month {}",
            id, reference.gender, reference.month_age
        );

        Ok(WhoReference {
            id,
            gender: reference.gender,
            month_age: reference.month_age,
            height_median_cm: reference.height_median_cm,
            weight_median_kg: reference.weight_median_kg,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_reference(&self, reference_id: i64) -> Result<Option<WhoReference>> {
        let query = format!("SELECT {} FROM who_data WHERE id = ?", REFERENCE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(reference_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_reference).transpose()
    }

    async fn list_references(&self, gender: Option<Gender>) -> Result<Vec<WhoReference>> {
        let rows = match gender {
            Some(gender) => {
                let query = format!(
                    "SELECT {} FROM who_data WHERE gender = ? ORDER BY month_age ASC",
                    REFERENCE_COLUMNS
                );
                sqlx::query(&query)
                    .bind(gender.as_str())
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {} FROM who_data ORDER BY gender ASC, month_age ASC",
                    REFERENCE_COLUMNS
                );
                sqlx::query(&query).fetch_all(self.db.pool()).await?
            }
        };

        rows.iter().map(Self::row_to_reference).collect()
    }

    async fn update_reference(&self, reference: &WhoReference) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE who_data
            SET gender = ?, month_age = ?, height_median_cm = ?, weight_median_kg = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(reference.gender.as_str())
        .bind(reference.month_age)
        .bind(reference.height_median_cm)
        .bind(reference.weight_median_kg)
        .bind(format_timestamp(reference.updated_at))
        .bind(reference.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, reference.gender, reference.month_age))?;

        if result.rows_affected() == 0 {
            warn!("Attempted to update a non-existent WHO reference: {}", reference.id);
        }
        Ok(())
    }

    async fn delete_reference(&self, reference_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM who_data WHERE id = ?")
            .bind(reference_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> WhoReferenceRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        WhoReferenceRepository::new(db)
    }

    fn median(gender: Gender, month_age: i64, height: f64, weight: f64) -> NewWhoReference {
        NewWhoReference::new(gender, month_age, height, weight).unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_by_gender_then_month() {
        let repo = setup_test().await;
        repo.store_reference(&median(Gender::Male, 1, 54.7, 4.5)).await.unwrap();
        repo.store_reference(&median(Gender::Female, 1, 53.7, 4.2)).await.unwrap();
        repo.store_reference(&median(Gender::Male, 0, 49.9, 3.3)).await.unwrap();
        repo.store_reference(&median(Gender::Female, 0, 49.1, 3.2)).await.unwrap();

        let keys: Vec<(Gender, i64)> = repo
            .list_references(None)
            .await
            .unwrap()
            .iter()
            .map(|r| (r.gender, r.month_age))
            .collect();
        assert_eq!(
            keys,
            vec![(Gender::Female, 0), (Gender::Female, 1), (Gender::Male, 0), (Gender::Male, 1)]
        );

        let boys = repo.list_references(Some(Gender::Male)).await.unwrap();
        assert_eq!(boys.iter().map(|r| r.month_age).collect::<Vec<_>>(), vec![0, 1]);
        assert!(boys.iter().all(|r| r.gender == Gender::Male));
    }

    #[tokio::test]
    async fn test_gender_and_month_are_unique() {
        let repo = setup_test().await;
        let stored = repo.store_reference(&median(Gender::Male, 6, 67.6, 7.9)).await.unwrap();
        assert_eq!(repo.get_reference(stored.id).await.unwrap(), Some(stored.clone()));

        let err = repo
            .store_reference(&median(Gender::Male, 6, 68.0, 8.0))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::DuplicateReference { gender: Gender::Male, month_age: 6 })
        );

        // The same month for the other gender is a different key
        repo.store_reference(&median(Gender::Female, 6, 65.7, 7.3)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_and_delete_reference() {
        let repo = setup_test().await;
        repo.store_reference(&median(Gender::Female, 2, 57.1, 5.1)).await.unwrap();
        let mut row = repo.store_reference(&median(Gender::Female, 3, 59.8, 5.8)).await.unwrap();

        row.month_age = 2;
        let err = repo.update_reference(&row).await.unwrap_err();
        assert!(err.downcast_ref::<StorageError>().is_some());

        row.month_age = 3;
        row.weight_median_kg = 5.9;
        repo.update_reference(&row).await.unwrap();
        assert_eq!(repo.get_reference(row.id).await.unwrap().unwrap().weight_median_kg, 5.9);

        assert!(repo.delete_reference(row.id).await.unwrap());
        assert!(!repo.delete_reference(row.id).await.unwrap());
        assert!(repo.get_reference(row.id).await.unwrap().is_none());
    }
}
