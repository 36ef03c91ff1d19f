use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

use crate::domain::models::measurement::{Measurement, MeasurementRecord, NewMeasurement};
use crate::storage::sqlite::connection::{format_timestamp, now_timestamp, parse_timestamp, DbConnection};
use crate::storage::traits::{MeasurementStorage, StorageError};

/// SQLite-backed measurement repository
#[derive(Clone)]
pub struct MeasurementRepository {
    db: DbConnection,
}

impl MeasurementRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_measurement(row: &SqliteRow) -> Result<Measurement> {
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(Measurement {
            id: row.get("id"),
            baby_id: row.get("baby_id"),
            month_age: row.get("month_age"),
            height_cm: row.get("height_cm"),
            weight_kg: row.get("weight_kg"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

/// Translate a `(baby_id, month_age)` unique violation into a typed storage error
fn map_unique_violation(err: sqlx::Error, baby_id: i64, month_age: i64) -> anyhow::Error {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StorageError::DuplicateMeasurement { baby_id, month_age }.into()
        }
        other => other.into(),
    }
}

#[async_trait]
impl MeasurementStorage for MeasurementRepository {
    async fn store_measurement(&self, measurement: &NewMeasurement) -> Result<Measurement> {
        let now = now_timestamp();
        let values = measurement.values;
        let result = sqlx::query(
            r#"
            INSERT INTO baby_data (baby_id, month_age, height_cm, weight_kg, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(measurement.baby_id)
        .bind(values.month_age)
        .bind(values.height_cm)
        .bind(values.weight_kg)
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, measurement.baby_id, values.month_age))?;

        let id = result.last_insert_rowid();
        info!(
            "Stored measurement {} for baby {} at month {}",
            id, measurement.baby_id, values.month_age
        );

        Ok(Measurement {
            id,
            baby_id: measurement.baby_id,
            month_age: values.month_age,
            height_cm: values.height_cm,
            weight_kg: values.weight_kg,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_measurement(&self, user_id: i64, measurement_id: i64) -> Result<Option<Measurement>> {
        let row = sqlx::query(
            r#"
            SELECT d.id, d.baby_id, d.month_age, d.height_cm, d.weight_kg, d.created_at, d.updated_at
            FROM baby_data d
            JOIN babies b ON b.id = d.baby_id
            WHERE d.id = ? AND b.user_id = ?
            "#,
        )
        .bind(measurement_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_measurement).transpose()
    }

    async fn find_measurement(&self, baby_id: i64, month_age: i64) -> Result<Option<Measurement>> {
        let row = sqlx::query(
            r#"
            SELECT id, baby_id, month_age, height_cm, weight_kg, created_at, updated_at
            FROM baby_data
            WHERE baby_id = ? AND month_age = ?
            "#,
        )
        .bind(baby_id)
        .bind(month_age)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_measurement).transpose()
    }

    async fn list_measurements(&self, user_id: i64) -> Result<Vec<MeasurementRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.baby_id, d.month_age, d.height_cm, d.weight_kg, d.created_at, d.updated_at,
                   b.name AS baby_name
            FROM baby_data d
            JOIN babies b ON b.id = d.baby_id
            WHERE b.user_id = ?
            ORDER BY d.baby_id ASC, d.month_age ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MeasurementRecord {
                    measurement: Self::row_to_measurement(row)?,
                    baby_name: row.get("baby_name"),
                })
            })
            .collect()
    }

    async fn update_measurement(&self, measurement: &Measurement) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE baby_data
            SET baby_id = ?, month_age = ?, height_cm = ?, weight_kg = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(measurement.baby_id)
        .bind(measurement.month_age)
        .bind(measurement.height_cm)
        .bind(measurement.weight_kg)
        .bind(format_timestamp(measurement.updated_at))
        .bind(measurement.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, measurement.baby_id, measurement.month_age))?;

        if result.rows_affected() == 0 {
            warn!("Attempted to update a non-existent measurement: {}", measurement.id);
        }
        Ok(())
    }

    async fn delete_measurement(&self, user_id: i64, measurement_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM baby_data
            WHERE id = ? AND baby_id IN (SELECT id FROM babies WHERE user_id = ?)
            "#,
        )
        .bind(measurement_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
