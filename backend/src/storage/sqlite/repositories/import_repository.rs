use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::storage::sqlite::connection::{format_date, format_timestamp, now_timestamp, DbConnection};
use crate::storage::traits::{ImportStorage, ReplacementBaby};

/// Bulk writes for the import pipeline, each run inside one transaction
#[derive(Clone)]
pub struct ImportRepository {
    db: DbConnection,
}

impl ImportRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImportStorage for ImportRepository {
    async fn replace_user_data(&self, user_id: i64, babies: &[ReplacementBaby]) -> Result<u64> {
        let now = format_timestamp(now_timestamp());
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM baby_data WHERE baby_id IN (SELECT id FROM babies WHERE user_id = ?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query("DELETE FROM babies WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut measurement_count = 0usize;
        for entry in babies {
            let baby_id = sqlx::query(
                r#"
                INSERT INTO babies (user_id, name, gender, birth_date, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(&entry.baby.name)
            .bind(entry.baby.gender.as_str())
            .bind(format_date(entry.baby.birth_date))
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for values in &entry.measurements {
                sqlx::query(
                    r#"
                    INSERT INTO baby_data (baby_id, month_age, height_cm, weight_kg, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(baby_id)
                .bind(values.month_age)
                .bind(values.height_cm)
                .bind(values.weight_kg)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
            measurement_count += entry.measurements.len();
        }

        tx.commit().await?;
        info!(
            "Replaced data for user {}: removed {} babies, created {} babies and {} measurements",
            user_id,
            removed,
            babies.len(),
            measurement_count
        );

        Ok(removed)
    }
}
