//! Export service domain logic.
//!
//! Renders a user's babies and measurements to CSV and, for the full export,
//! packages both files into one store-only ZIP archive. Either every file is
//! produced or the whole export fails.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::codec::{encode_records, CsvValue, ZipWriter};
use crate::domain::models::baby::Baby;
use crate::domain::models::measurement::MeasurementRecord;
use crate::storage::traits::{BabyStorage, Connection, MeasurementStorage};

pub const BABIES_FILE: &str = "babies.csv";
pub const BABY_DATA_FILE: &str = "baby-data.csv";

pub const BABY_COLUMNS: [&str; 4] = ["id", "name", "gender", "birthDate"];
pub const BABY_DATA_COLUMNS: [&str; 7] = [
    "id",
    "babyId",
    "babyName",
    "monthAge",
    "heightCm",
    "weightKg",
    "createdAt",
];

/// A rendered download: suggested file name plus its bytes
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Render babies in the order given
pub fn render_babies_csv(babies: &[Baby]) -> String {
    encode_records(
        &BABY_COLUMNS,
        babies.iter().map(|baby| {
            vec![
                CsvValue::Integer(baby.id),
                CsvValue::from(baby.name.as_str()),
                CsvValue::from(baby.gender.as_str()),
                CsvValue::Date(baby.birth_date),
            ]
        }),
    )
}

/// Render measurements with the baby name denormalized for re-import
pub fn render_measurements_csv(records: &[MeasurementRecord]) -> String {
    encode_records(
        &BABY_DATA_COLUMNS,
        records.iter().map(|record| {
            let m = &record.measurement;
            vec![
                CsvValue::Integer(m.id),
                CsvValue::Integer(m.baby_id),
                CsvValue::from(record.baby_name.as_str()),
                CsvValue::Integer(m.month_age),
                CsvValue::Number(m.height_cm),
                CsvValue::Number(m.weight_kg),
                CsvValue::Timestamp(m.created_at),
            ]
        }),
    )
}

/// Package both CSV files into one archive stamped with `now`
pub fn build_archive(babies: &[Baby], records: &[MeasurementRecord], now: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::with_timestamp(now);
    writer
        .add_entry(BABIES_FILE, render_babies_csv(babies))
        .add_entry(BABY_DATA_FILE, render_measurements_csv(records));
    writer.finish().context("Failed to assemble export archive")
}

fn dated_name(prefix: &str, extension: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.{}", prefix, now.format("%Y-%m-%d"), extension)
}

/// Export service producing CSV and ZIP downloads of a user's data
#[derive(Clone)]
pub struct ExportService<C: Connection> {
    baby_repository: C::BabyRepository,
    measurement_repository: C::MeasurementRepository,
}

impl<C: Connection> ExportService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            baby_repository: connection.create_baby_repository(),
            measurement_repository: connection.create_measurement_repository(),
        }
    }

    /// Both CSV files in one archive named `baby-growth-export-<date>.zip`
    pub async fn export_archive(&self, user_id: i64) -> Result<ExportFile> {
        info!("📦 EXPORT: Building archive for user {}", user_id);

        let now = Utc::now();
        let babies = self.baby_repository.list_babies(user_id).await?;
        let records = self.measurement_repository.list_measurements(user_id).await?;
        let bytes = build_archive(&babies, &records, now)?;

        info!(
            "✅ EXPORT: Archived {} babies and {} measurements ({} bytes)",
            babies.len(),
            records.len(),
            bytes.len()
        );

        Ok(ExportFile {
            file_name: dated_name("baby-growth-export", "zip", now),
            bytes,
        })
    }

    /// `babies.csv` alone, named `babies-<date>.csv`
    pub async fn export_babies_csv(&self, user_id: i64) -> Result<ExportFile> {
        info!("📄 EXPORT: Rendering babies CSV for user {}", user_id);

        let babies = self.baby_repository.list_babies(user_id).await?;
        Ok(ExportFile {
            file_name: dated_name("babies", "csv", Utc::now()),
            bytes: render_babies_csv(&babies).into_bytes(),
        })
    }

    /// `baby-data.csv` alone, named `baby-data-<date>.csv`
    pub async fn export_measurements_csv(&self, user_id: i64) -> Result<ExportFile> {
        info!("📄 EXPORT: Rendering measurements CSV for user {}", user_id);

        let records = self.measurement_repository.list_measurements(user_id).await?;
        Ok(ExportFile {
            file_name: dated_name("baby-data", "csv", Utc::now()),
            bytes: render_measurements_csv(&records).into_bytes(),
        })
    }
}
