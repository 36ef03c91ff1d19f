use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::repositories::{
    BabyRepository, ImportRepository, MeasurementRepository, UserRepository, WhoReferenceRepository,
};
use crate::storage::traits::Connection;

/// DbConnection manages the SQLite pool shared by every repository
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if missing) the database at `url` and set up the schema
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database url: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::setup_schema(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a private in-memory database for tests
    pub async fn init_test() -> Result<Self> {
        // A single long-lived connection keeps the in-memory database alive
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS babies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                gender TEXT NOT NULL CHECK (gender IN ('MALE', 'FEMALE')),
                birth_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_babies_user_id
            ON babies(user_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS baby_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                baby_id INTEGER NOT NULL,
                month_age INTEGER NOT NULL CHECK (month_age BETWEEN 0 AND 240),
                height_cm REAL NOT NULL CHECK (height_cm > 0),
                weight_kg REAL NOT NULL CHECK (weight_kg > 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (baby_id, month_age),
                FOREIGN KEY (baby_id) REFERENCES babies (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS who_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                gender TEXT NOT NULL CHECK (gender IN ('MALE', 'FEMALE')),
                month_age INTEGER NOT NULL CHECK (month_age BETWEEN 0 AND 240),
                height_median_cm REAL NOT NULL CHECK (height_median_cm > 0),
                weight_median_kg REAL NOT NULL CHECK (weight_median_kg > 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (gender, month_age)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl Connection for DbConnection {
    type UserRepository = UserRepository;
    type BabyRepository = BabyRepository;
    type MeasurementRepository = MeasurementRepository;
    type ImportRepository = ImportRepository;
    type WhoReferenceRepository = WhoReferenceRepository;

    fn create_user_repository(&self) -> Self::UserRepository {
        UserRepository::new(self.clone())
    }

    fn create_baby_repository(&self) -> Self::BabyRepository {
        BabyRepository::new(self.clone())
    }

    fn create_measurement_repository(&self) -> Self::MeasurementRepository {
        MeasurementRepository::new(self.clone())
    }

    fn create_import_repository(&self) -> Self::ImportRepository {
        ImportRepository::new(self.clone())
    }

    fn create_who_reference_repository(&self) -> Self::WhoReferenceRepository {
        WhoReferenceRepository::new(self.clone())
    }
}

/// Timestamps are stored as RFC 3339 text with millisecond precision
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid stored timestamp: {}", value))?
        .with_timezone(&Utc))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid stored date: {}", value))
}

/// Current time truncated to what the store keeps, so returned models equal reloaded ones
pub(crate) fn now_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    // Round trip through the storage format drops sub-millisecond precision
    parse_timestamp(&format_timestamp(now)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        DbConnection::setup_schema(db.pool()).await.expect("Second schema setup failed");
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("growth.db").display());
        let db = DbConnection::new(&url).await.expect("Failed to open file database");
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM babies")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = now_timestamp();
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }
}
