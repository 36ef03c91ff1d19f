use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

use crate::domain::models::baby::{Baby, NewBaby};
use crate::storage::sqlite::connection::{
    format_date, format_timestamp, now_timestamp, parse_date, parse_timestamp, DbConnection,
};
use crate::storage::traits::BabyStorage;

const BABY_COLUMNS: &str = "id, user_id, name, gender, birth_date, created_at, updated_at";

/// SQLite-backed baby repository
#[derive(Clone)]
pub struct BabyRepository {
    db: DbConnection,
}

impl BabyRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_baby(row: &SqliteRow) -> Result<Baby> {
        let gender: String = row.get("gender");
        let birth_date: String = row.get("birth_date");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(Baby {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            gender: gender.parse()?,
            birth_date: parse_date(&birth_date)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

#[async_trait]
impl BabyStorage for BabyRepository {
    async fn store_baby(&self, user_id: i64, baby: &NewBaby) -> Result<Baby> {
        let now = now_timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO babies (user_id, name, gender, birth_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&baby.name)
        .bind(baby.gender.as_str())
        .bind(format_date(baby.birth_date))
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        info!("Stored baby {} ({}) for user {}", id, baby.name, user_id);

        Ok(Baby {
            id,
            user_id,
            name: baby.name.clone(),
            gender: baby.gender,
            birth_date: baby.birth_date,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_baby(&self, user_id: i64, baby_id: i64) -> Result<Option<Baby>> {
        let query = format!("SELECT {} FROM babies WHERE id = ? AND user_id = ?", BABY_COLUMNS);
        let row = sqlx::query(&query)
            .bind(baby_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_baby).transpose()
    }

    async fn list_babies(&self, user_id: i64) -> Result<Vec<Baby>> {
        let query = format!("SELECT {} FROM babies WHERE user_id = ? ORDER BY id ASC", BABY_COLUMNS);
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_baby).collect()
    }

    async fn update_baby(&self, baby: &Baby) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE babies
            SET name = ?, gender = ?, birth_date = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&baby.name)
        .bind(baby.gender.as_str())
        .bind(format_date(baby.birth_date))
        .bind(format_timestamp(baby.updated_at))
        .bind(baby.id)
        .bind(baby.user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            warn!("Attempted to update a non-existent baby: {}", baby.id);
        }
        Ok(())
    }

    async fn delete_baby(&self, user_id: i64, baby_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM babies WHERE id = ? AND user_id = ?")
            .bind(baby_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
