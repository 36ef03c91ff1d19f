//! Import service domain logic.
//!
//! Unpacks an uploaded archive, projects both CSV files into validated
//! candidate rows, and reconciles them with the user's stored data under the
//! requested [`ImportMode`]. Babies are matched by name and measurements by
//! `(baby, monthAge)`.

use shared::{DataImportStats, ImportMode, ImportStats};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::codec::{read_archive, ArchiveError, CsvTable};
use crate::domain::export_service::{BABIES_FILE, BABY_DATA_FILE};
use crate::domain::import_locks::ImportLocks;
use crate::domain::models::baby::{parse_birth_date, Gender, NewBaby};
use crate::domain::models::measurement::{GrowthValues, NewMeasurement};
use crate::storage::sqlite::connection::now_timestamp;
use crate::storage::traits::{
    BabyStorage, Connection, ImportStorage, MeasurementStorage, ReplacementBaby,
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid zip file: {0}")]
    InvalidArchive(#[from] ArchiveError),
    #[error("Missing babies.csv or baby-data.csv")]
    MissingEntries,
    #[error("Import failed: {0}")]
    Storage(#[from] anyhow::Error),
}

/// A `baby-data.csv` row that passed validation, keyed by baby name
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementCandidate {
    pub baby_name: String,
    pub values: GrowthValues,
}

/// Validated rows of both files, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportCandidates {
    pub babies: Vec<NewBaby>,
    pub measurements: Vec<MeasurementCandidate>,
    pub dropped_babies: usize,
    pub dropped_measurements: usize,
}

fn baby_candidate(table: &CsvTable, row: &[String]) -> Option<NewBaby> {
    let name = table.get(row, "name")?;
    // Absent or unknown genders fall back to MALE
    let gender = table
        .get(row, "gender")
        .and_then(|g| g.parse::<Gender>().ok())
        .unwrap_or(Gender::Male);
    let birth_date = parse_birth_date(table.get(row, "birthDate")?).ok()?;
    NewBaby::new(name, gender, birth_date).ok()
}

fn measurement_candidate(table: &CsvTable, row: &[String]) -> Option<MeasurementCandidate> {
    let baby_name = table.get(row, "babyName")?.trim();
    if baby_name.is_empty() {
        return None;
    }
    let month_age = table.get(row, "monthAge")?.trim().parse::<i64>().ok()?;
    let height_cm = table.get(row, "heightCm")?.trim().parse::<f64>().ok()?;
    let weight_kg = table.get(row, "weightKg")?.trim().parse::<f64>().ok()?;

    Some(MeasurementCandidate {
        baby_name: baby_name.to_string(),
        values: GrowthValues::new(month_age, height_cm, weight_kg).ok()?,
    })
}

/// Project both CSV texts into candidates, dropping rows that fail validation
pub fn parse_candidates(babies_csv: &str, data_csv: &str) -> ImportCandidates {
    let mut candidates = ImportCandidates::default();

    let babies = CsvTable::parse(babies_csv);
    for row in babies.rows() {
        match baby_candidate(&babies, row) {
            Some(baby) => candidates.babies.push(baby),
            None => {
                debug!("Dropping invalid babies.csv row: {:?}", row);
                candidates.dropped_babies += 1;
            }
        }
    }

    let data = CsvTable::parse(data_csv);
    for row in data.rows() {
        match measurement_candidate(&data, row) {
            Some(measurement) => candidates.measurements.push(measurement),
            None => {
                debug!("Dropping invalid baby-data.csv row: {:?}", row);
                candidates.dropped_measurements += 1;
            }
        }
    }

    candidates
}

/// Group candidates into the babies a replace-mode import recreates.
///
/// Every candidate baby is kept. A measurement attaches to the last baby with
/// its name, and a repeated month-age for the same baby overwrites the
/// earlier values and counts as an update.
pub fn plan_replacement(candidates: &ImportCandidates) -> (Vec<ReplacementBaby>, DataImportStats) {
    let mut plan: Vec<ReplacementBaby> = candidates
        .babies
        .iter()
        .map(|baby| ReplacementBaby {
            baby: baby.clone(),
            measurements: Vec::new(),
        })
        .collect();

    let by_name: HashMap<&str, usize> = candidates
        .babies
        .iter()
        .enumerate()
        .map(|(index, baby)| (baby.name.as_str(), index))
        .collect();

    let mut stats = DataImportStats::default();
    for candidate in &candidates.measurements {
        let Some(&index) = by_name.get(candidate.baby_name.as_str()) else {
            stats.skipped += 1;
            continue;
        };

        let measurements = &mut plan[index].measurements;
        match measurements
            .iter_mut()
            .find(|existing| existing.month_age == candidate.values.month_age)
        {
            Some(existing) => {
                *existing = candidate.values;
                stats.updated += 1;
            }
            None => {
                measurements.push(candidate.values);
                stats.created += 1;
            }
        }
    }

    (plan, stats)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Import service reconciling uploaded archives with stored data
#[derive(Clone)]
pub struct ImportService<C: Connection> {
    baby_repository: C::BabyRepository,
    measurement_repository: C::MeasurementRepository,
    import_repository: C::ImportRepository,
    locks: ImportLocks,
}

impl<C: Connection> ImportService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            baby_repository: connection.create_baby_repository(),
            measurement_repository: connection.create_measurement_repository(),
            import_repository: connection.create_import_repository(),
            locks: ImportLocks::new(),
        }
    }

    /// Import an archive for `user_id`. Imports for the same user are serialized.
    pub async fn import_archive(
        &self,
        user_id: i64,
        bytes: &[u8],
        mode: ImportMode,
    ) -> Result<ImportStats, ImportError> {
        info!("📥 IMPORT: {} bytes for user {} in {} mode", bytes.len(), user_id, mode);

        let archive = read_archive(bytes).map_err(|e| {
            warn!("❌ IMPORT: Rejected archive: {}", e);
            ImportError::from(e)
        })?;

        let (Some(babies_bytes), Some(data_bytes)) = (archive.get(BABIES_FILE), archive.get(BABY_DATA_FILE))
        else {
            warn!("❌ IMPORT: Archive lacks {} or {}", BABIES_FILE, BABY_DATA_FILE);
            return Err(ImportError::MissingEntries);
        };

        let candidates = parse_candidates(
            &String::from_utf8_lossy(babies_bytes),
            &String::from_utf8_lossy(data_bytes),
        );
        debug!(
            "Parsed {} babies ({} dropped) and {} measurements ({} dropped)",
            candidates.babies.len(),
            candidates.dropped_babies,
            candidates.measurements.len(),
            candidates.dropped_measurements
        );

        let _guard = self.locks.acquire(user_id).await;
        let stats = match mode {
            ImportMode::Replace => self.replace(user_id, &candidates).await?,
            ImportMode::Append => self.append(user_id, &candidates).await?,
        };

        info!("✅ IMPORT: Completed for user {}: {:?}", user_id, stats);
        Ok(stats)
    }

    async fn replace(&self, user_id: i64, candidates: &ImportCandidates) -> anyhow::Result<ImportStats> {
        let (plan, data) = plan_replacement(candidates);
        let removed = self.import_repository.replace_user_data(user_id, &plan).await?;

        let mut stats = ImportStats::new(ImportMode::Replace);
        stats.babies.created = count(plan.len());
        stats.babies.removed = u32::try_from(removed).unwrap_or(u32::MAX);
        stats.data = data;
        Ok(stats)
    }

    async fn append(&self, user_id: i64, candidates: &ImportCandidates) -> anyhow::Result<ImportStats> {
        let mut stats = ImportStats::new(ImportMode::Append);

        // Listing is id ascending, so the newest baby wins a shared name
        let mut name_to_id: HashMap<String, i64> = self
            .baby_repository
            .list_babies(user_id)
            .await?
            .into_iter()
            .map(|baby| (baby.name, baby.id))
            .collect();

        for candidate in &candidates.babies {
            if name_to_id.contains_key(&candidate.name) {
                debug!("Reusing existing baby {}", candidate.name);
                continue;
            }
            let baby = self.baby_repository.store_baby(user_id, candidate).await?;
            name_to_id.insert(baby.name, baby.id);
            stats.babies.created += 1;
        }

        for candidate in &candidates.measurements {
            let Some(&baby_id) = name_to_id.get(&candidate.baby_name) else {
                debug!("No baby named {} for measurement", candidate.baby_name);
                stats.data.skipped += 1;
                continue;
            };

            let values = candidate.values;
            match self
                .measurement_repository
                .find_measurement(baby_id, values.month_age)
                .await?
            {
                Some(mut existing) => {
                    existing.height_cm = values.height_cm;
                    existing.weight_kg = values.weight_kg;
                    existing.updated_at = now_timestamp();
                    self.measurement_repository.update_measurement(&existing).await?;
                    stats.data.updated += 1;
                }
                None => {
                    self.measurement_repository
                        .store_measurement(&NewMeasurement { baby_id, values })
                        .await?;
                    stats.data.created += 1;
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ZipWriter;
    use crate::domain::export_service::ExportService;
    use crate::storage::traits::UserStorage;
    use crate::storage::DbConnection;
    use chrono::NaiveDate;

    const BABY_HEADER: &str = "id,name,gender,birthDate\n";
    const DATA_HEADER: &str = "id,babyId,babyName,monthAge,heightCm,weightKg,createdAt\n";

    struct TestContext {
        service: ImportService<DbConnection>,
        db: DbConnection,
        user_id: i64,
    }

    async fn setup_test() -> TestContext {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let user_id = db.create_user_repository().create_user("parent@example.com").await.unwrap();
        TestContext {
            service: ImportService::new(Arc::new(db.clone())),
            db,
            user_id,
        }
    }

    fn archive(babies: &str, data: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new();
        writer
            .add_entry(BABIES_FILE, format!("{}{}", BABY_HEADER, babies))
            .add_entry(BABY_DATA_FILE, format!("{}{}", DATA_HEADER, data));
        writer.finish().unwrap()
    }

    async fn seed_baby(ctx: &TestContext, name: &str, months: &[i64]) -> i64 {
        let baby = NewBaby::new(name, Gender::Female, NaiveDate::from_ymd_opt(2023, 3, 3).unwrap()).unwrap();
        let baby = ctx.db.create_baby_repository().store_baby(ctx.user_id, &baby).await.unwrap();
        for &month_age in months {
            ctx.db
                .create_measurement_repository()
                .store_measurement(&NewMeasurement {
                    baby_id: baby.id,
                    values: GrowthValues::new(month_age, 50.0 + month_age as f64, 3.5).unwrap(),
                })
                .await
                .unwrap();
        }
        baby.id
    }

    async fn measurements(ctx: &TestContext) -> Vec<(String, i64, f64, f64)> {
        ctx.db
            .create_measurement_repository()
            .list_measurements(ctx.user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| {
                (
                    r.baby_name,
                    r.measurement.month_age,
                    r.measurement.height_cm,
                    r.measurement.weight_kg,
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_candidates_drops_invalid_rows() {
        let candidates = parse_candidates(
            "name,gender,birthDate\n Ada ,FEMALE,2024-01-01\n,MALE,2024-01-01\nBo,other,2024-02-02\nCy,MALE,not-a-date\n",
            "babyName,monthAge,heightCm,weightKg\nAda,1,54.5,4.4\nAda,2,0,5\nAda,-1,50,3\nAda,1.5,50,3\n,3,60,6\nAda,241,60,6\nAda,4,abc,6\n",
        );

        assert_eq!(candidates.babies.len(), 2);
        assert_eq!(candidates.babies[0].name, "Ada");
        assert_eq!(candidates.babies[1].gender, Gender::Male);
        assert_eq!(candidates.dropped_babies, 2);

        assert_eq!(candidates.measurements.len(), 1);
        assert_eq!(candidates.measurements[0].values.month_age, 1);
        assert_eq!(candidates.dropped_measurements, 6);
    }

    #[test]
    fn test_plan_replacement_last_name_wins() {
        let candidates = parse_candidates(
            "name,gender,birthDate\nAda,FEMALE,2024-01-01\nAda,FEMALE,2024-05-05\n",
            "babyName,monthAge,heightCm,weightKg\nAda,1,54,4\nAda,1,55,4.2\nGhost,1,50,3\n",
        );

        let (plan, stats) = plan_replacement(&candidates);
        assert_eq!(plan.len(), 2);
        assert!(plan[0].measurements.is_empty());
        assert_eq!(plan[1].measurements.len(), 1);
        assert_eq!(plan[1].measurements[0].height_cm, 55.0);
        assert_eq!(stats, DataImportStats { created: 1, updated: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn test_rejects_bad_archives() {
        let ctx = setup_test().await;

        let err = ctx
            .service
            .import_archive(ctx.user_id, b"not a zip", ImportMode::Append)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidArchive(_)));

        let mut writer = ZipWriter::new();
        writer.add_entry(BABIES_FILE, BABY_HEADER);
        let only_babies = writer.finish().unwrap();
        let err = ctx
            .service
            .import_archive(ctx.user_id, &only_babies, ImportMode::Replace)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingEntries));
    }

    #[tokio::test]
    async fn test_replace_wipes_and_recreates() {
        let ctx = setup_test().await;
        seed_baby(&ctx, "A", &[0, 1, 2, 3]).await;
        seed_baby(&ctx, "B", &[0, 1, 2]).await;
        seed_baby(&ctx, "C", &[0, 1, 2]).await;

        let bytes = archive(
            "1,D,MALE,2024-01-01\n",
            "1,1,D,0,50,3.3\n2,1,D,1,54,4.1\n",
        );
        let stats = ctx
            .service
            .import_archive(ctx.user_id, &bytes, ImportMode::Replace)
            .await
            .unwrap();

        assert_eq!(stats.mode, ImportMode::Replace);
        assert_eq!(stats.babies.removed, 3);
        assert_eq!(stats.babies.created, 1);
        assert_eq!(stats.data, DataImportStats { created: 2, updated: 0, skipped: 0 });
        assert_eq!(measurements(&ctx).await.len(), 2);
    }

    #[tokio::test]
    async fn test_append_creates_and_updates() {
        let ctx = setup_test().await;
        seed_baby(&ctx, "Ada", &[1]).await;

        let bytes = archive(
            "9,Ada,FEMALE,2023-03-03\n10,Bo,MALE,2024-01-01\n",
            "1,9,Ada,1,60,5.5\n2,10,Bo,0,49.5,3.2\n3,10,Bo,0,50,3.3\n4,11,Zed,0,50,3\n5,10,Bo,2,0,4\n",
        );
        let stats = ctx
            .service
            .import_archive(ctx.user_id, &bytes, ImportMode::Append)
            .await
            .unwrap();

        assert_eq!(stats.mode, ImportMode::Append);
        assert_eq!(stats.babies.created, 1);
        assert_eq!(stats.babies.removed, 0);
        // heightCm = 0 is filtered before reconciliation and lands in no bucket
        assert_eq!(stats.data, DataImportStats { created: 1, updated: 2, skipped: 1 });

        assert_eq!(
            measurements(&ctx).await,
            vec![
                ("Ada".to_string(), 1, 60.0, 5.5),
                ("Bo".to_string(), 0, 50.0, 3.3),
            ]
        );
    }

    #[tokio::test]
    async fn test_append_twice_is_idempotent() {
        let ctx = setup_test().await;
        let bytes = archive("1,Ada,FEMALE,2024-01-01\n", "1,1,Ada,0,50,3.3\n");

        ctx.service.import_archive(ctx.user_id, &bytes, ImportMode::Append).await.unwrap();
        let second = ctx
            .service
            .import_archive(ctx.user_id, &bytes, ImportMode::Append)
            .await
            .unwrap();

        assert_eq!(second.babies.created, 0);
        assert_eq!(second.data, DataImportStats { created: 0, updated: 1, skipped: 0 });
        assert_eq!(measurements(&ctx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_append_prefers_newest_existing_name() {
        let ctx = setup_test().await;
        seed_baby(&ctx, "Twin", &[]).await;
        let newest = seed_baby(&ctx, "Twin", &[]).await;

        let bytes = archive("", "1,1,Twin,5,65,7\n");
        ctx.service.import_archive(ctx.user_id, &bytes, ImportMode::Append).await.unwrap();

        let found = ctx
            .db
            .create_measurement_repository()
            .find_measurement(newest, 5)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_export_then_replace_round_trips() {
        let ctx = setup_test().await;
        seed_baby(&ctx, "Smith, \"Junior\"", &[0, 6]).await;
        seed_baby(&ctx, "Mia", &[3]).await;
        let before = measurements(&ctx).await;

        let export = ExportService::new(Arc::new(ctx.db.clone()))
            .export_archive(ctx.user_id)
            .await
            .unwrap();
        let stats = ctx
            .service
            .import_archive(ctx.user_id, &export.bytes, ImportMode::Replace)
            .await
            .unwrap();

        assert_eq!(stats.babies.removed, 2);
        assert_eq!(stats.babies.created, 2);
        assert_eq!(stats.data.skipped, 0);
        assert_eq!(measurements(&ctx).await, before);
    }
}
