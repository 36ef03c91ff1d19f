use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;
use tracing::info;

use crate::storage::sqlite::connection::{format_timestamp, now_timestamp, DbConnection};
use crate::storage::traits::UserStorage;

/// SQLite-backed lookups of authenticated users
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<i64>> {
        let row = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| r.get::<i64, _>("id")))
    }

    async fn create_user(&self, email: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (email, created_at) VALUES (?, ?)")
            .bind(email)
            .bind(format_timestamp(now_timestamp()))
            .execute(self.db.pool())
            .await?;

        let id = result.last_insert_rowid();
        info!("Created user {} for {}", id, email);
        Ok(id)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() > 0 {
            info!("Deleted user {}", user_id);
        }
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::baby::{Gender, NewBaby};
    use crate::domain::models::measurement::{GrowthValues, NewMeasurement};
    use crate::storage::sqlite::repositories::{BabyRepository, MeasurementRepository};
    use crate::storage::traits::{BabyStorage, MeasurementStorage};
    use chrono::NaiveDate;

    async fn setup_test() -> UserRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        UserRepository::new(db)
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = setup_test().await;

        assert_eq!(repo.find_user_id_by_email("ada@example.com").await.unwrap(), None);

        let id = repo.create_user("ada@example.com").await.unwrap();
        assert_eq!(repo.find_user_id_by_email("ada@example.com").await.unwrap(), Some(id));
        assert_eq!(repo.find_user_id_by_email("lin@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let repo = setup_test().await;
        repo.create_user("ada@example.com").await.unwrap();
        assert!(repo.create_user("ada@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_babies_and_measurements() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = UserRepository::new(db.clone());
        let babies = BabyRepository::new(db.clone());
        let measurements = MeasurementRepository::new(db);

        let leaving = repo.create_user("leaving@example.com").await.unwrap();
        let staying = repo.create_user("staying@example.com").await.unwrap();
        let birth_date = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        for user_id in [leaving, staying] {
            let baby = babies
                .store_baby(user_id, &NewBaby::new("Ada", Gender::Female, birth_date).unwrap())
                .await
                .unwrap();
            measurements
                .store_measurement(&NewMeasurement {
                    baby_id: baby.id,
                    values: GrowthValues::new(1, 54.0, 4.2).unwrap(),
                })
                .await
                .unwrap();
        }

        assert!(repo.delete_user(leaving).await.unwrap());
        assert!(!repo.delete_user(leaving).await.unwrap());

        assert_eq!(repo.find_user_id_by_email("leaving@example.com").await.unwrap(), None);
        assert!(babies.list_babies(leaving).await.unwrap().is_empty());
        assert!(measurements.list_measurements(leaving).await.unwrap().is_empty());
        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM baby_data")
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        assert_eq!(remaining.0, 1);

        assert_eq!(babies.list_babies(staying).await.unwrap().len(), 1);
        assert_eq!(measurements.list_measurements(staying).await.unwrap().len(), 1);
    }
}
