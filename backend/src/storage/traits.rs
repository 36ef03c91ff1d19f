//! # Storage Traits
//!
//! Storage abstraction traits that let the domain layer work against any
//! backend that can honour the same ownership and uniqueness rules.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::baby::{Baby, Gender, NewBaby};
use crate::domain::models::measurement::{GrowthValues, Measurement, MeasurementRecord, NewMeasurement};
use crate::domain::models::who_reference::{NewWhoReference, WhoReference};

/// Typed storage failures the domain layer reacts to.
///
/// These travel inside `anyhow::Error` and are recovered with `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("measurement for baby {baby_id} at month {month_age} already exists")]
    DuplicateMeasurement { baby_id: i64, month_age: i64 },
    #[error("reference row for {gender} at month {month_age} already exists")]
    DuplicateReference { gender: Gender, month_age: i64 },
}

/// Identity lookups for authenticated callers
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Resolve an authenticated email to a user id
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<i64>>;

    /// Create a user and return its id
    async fn create_user(&self, email: &str) -> Result<i64>;

    /// Delete a user and, by cascade, their babies and measurements.
    /// Returns false if no such user exists.
    async fn delete_user(&self, user_id: i64) -> Result<bool>;
}

/// Baby storage operations, always scoped to the owning user
#[async_trait]
pub trait BabyStorage: Send + Sync {
    /// Store a new baby and return it with its assigned id
    async fn store_baby(&self, user_id: i64, baby: &NewBaby) -> Result<Baby>;

    /// Retrieve a baby owned by `user_id`
    async fn get_baby(&self, user_id: i64, baby_id: i64) -> Result<Option<Baby>>;

    /// List a user's babies ordered by id ascending
    async fn list_babies(&self, user_id: i64) -> Result<Vec<Baby>>;

    /// Persist name, gender and birth date of an existing baby
    async fn update_baby(&self, baby: &Baby) -> Result<()>;

    /// Delete a baby and, by cascade, its measurements.
    /// Returns false if the user owns no such baby.
    async fn delete_baby(&self, user_id: i64, baby_id: i64) -> Result<bool>;
}

/// Measurement storage operations
#[async_trait]
pub trait MeasurementStorage: Send + Sync {
    /// Store a new measurement.
    /// Fails with [`StorageError::DuplicateMeasurement`] if `(baby_id, month_age)` is taken.
    async fn store_measurement(&self, measurement: &NewMeasurement) -> Result<Measurement>;

    /// Retrieve a measurement whose baby is owned by `user_id`
    async fn get_measurement(&self, user_id: i64, measurement_id: i64) -> Result<Option<Measurement>>;

    /// Look up the measurement at `(baby_id, month_age)`
    async fn find_measurement(&self, baby_id: i64, month_age: i64) -> Result<Option<Measurement>>;

    /// List all of a user's measurements joined with the baby name,
    /// ordered by baby id then month-age ascending
    async fn list_measurements(&self, user_id: i64) -> Result<Vec<MeasurementRecord>>;

    /// Persist every field of an existing measurement.
    /// Fails with [`StorageError::DuplicateMeasurement`] on a key collision.
    async fn update_measurement(&self, measurement: &Measurement) -> Result<()>;

    /// Delete a measurement. Returns false if the user owns no such measurement.
    async fn delete_measurement(&self, user_id: i64, measurement_id: i64) -> Result<bool>;
}

/// WHO median reference rows, shared by every user
#[async_trait]
pub trait WhoReferenceStorage: Send + Sync {
    /// Store a reference row.
    /// Fails with [`StorageError::DuplicateReference`] if `(gender, month_age)` is taken.
    async fn store_reference(&self, reference: &NewWhoReference) -> Result<WhoReference>;

    async fn get_reference(&self, reference_id: i64) -> Result<Option<WhoReference>>;

    /// List reference rows ordered by gender then month-age, optionally for one gender
    async fn list_references(&self, gender: Option<Gender>) -> Result<Vec<WhoReference>>;

    /// Persist every field of an existing row.
    /// Fails with [`StorageError::DuplicateReference`] on a key collision.
    async fn update_reference(&self, reference: &WhoReference) -> Result<()>;

    /// Returns false if no such row exists
    async fn delete_reference(&self, reference_id: i64) -> Result<bool>;
}

/// A baby to recreate during a replace-mode import, with its measurements
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementBaby {
    pub baby: NewBaby,
    pub measurements: Vec<GrowthValues>,
}

/// Bulk operations used by the import pipeline
#[async_trait]
pub trait ImportStorage: Send + Sync {
    /// Atomically delete all of a user's measurements and babies, then create
    /// `babies` with their measurements. Nothing changes if any step fails.
    /// Returns the number of babies removed.
    async fn replace_user_data(&self, user_id: i64, babies: &[ReplacementBaby]) -> Result<u64>;
}

/// Factory for the repositories of one storage backend.
///
/// Services are generic over this trait so tests and alternative backends
/// can plug in without changes to the domain layer.
pub trait Connection: Send + Sync + Clone + 'static {
    type UserRepository: UserStorage + Clone;
    type BabyRepository: BabyStorage + Clone;
    type MeasurementRepository: MeasurementStorage + Clone;
    type ImportRepository: ImportStorage + Clone;
    type WhoReferenceRepository: WhoReferenceStorage + Clone;

    fn create_user_repository(&self) -> Self::UserRepository;
    fn create_baby_repository(&self) -> Self::BabyRepository;
    fn create_measurement_repository(&self) -> Self::MeasurementRepository;
    fn create_import_repository(&self) -> Self::ImportRepository;
    fn create_who_reference_repository(&self) -> Self::WhoReferenceRepository;
}
