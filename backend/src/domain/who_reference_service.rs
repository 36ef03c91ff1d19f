//! WHO reference medians.
//!
//! A single table shared by every user: the median height and weight per
//! gender and month-age that a baby's measurements are charted against.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::who_reference::{CreateWhoReferenceCommand, UpdateWhoReferenceCommand};
use crate::domain::models::baby::Gender;
use crate::domain::models::measurement::{
    validate_height, validate_month_age, validate_weight, MeasurementValidationError,
};
use crate::domain::models::who_reference::{NewWhoReference, WhoReference};
use crate::storage::sqlite::connection::now_timestamp;
use crate::storage::traits::{Connection, StorageError, WhoReferenceStorage};

#[derive(Debug, thiserror::Error)]
pub enum WhoReferenceError {
    #[error(transparent)]
    Validation(#[from] MeasurementValidationError),
    #[error("WHO reference {0} not found")]
    NotFound(i64),
    #[error("Duplicate monthAge {month_age} for {gender}")]
    DuplicateReference { gender: Gender, month_age: i64 },
    #[error(transparent)]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for WhoReferenceError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(StorageError::DuplicateReference { gender, month_age }) =
            err.downcast_ref::<StorageError>().cloned()
        {
            return WhoReferenceError::DuplicateReference { gender, month_age };
        }
        WhoReferenceError::Storage(err)
    }
}

#[derive(Clone)]
pub struct WhoReferenceService<C: Connection> {
    reference_repository: C::WhoReferenceRepository,
}

impl<C: Connection> WhoReferenceService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            reference_repository: connection.create_who_reference_repository(),
        }
    }

    /// List reference rows by gender then month-age, optionally for one gender
    pub async fn list_references(&self, gender: Option<Gender>) -> Result<Vec<WhoReference>, WhoReferenceError> {
        let references = self.reference_repository.list_references(gender).await?;
        info!("Found {} WHO reference rows (gender filter: {:?})", references.len(), gender);
        Ok(references)
    }

    pub async fn create_reference(
        &self,
        command: CreateWhoReferenceCommand,
    ) -> Result<WhoReference, WhoReferenceError> {
        info!(
            "Creating WHO reference for {} at month {}",
            command.gender, command.month_age
        );

        let reference = NewWhoReference::new(
            command.gender,
            command.month_age,
            command.height_median_cm,
            command.weight_median_kg,
        )?;
        Ok(self.reference_repository.store_reference(&reference).await?)
    }

    pub async fn update_reference(
        &self,
        reference_id: i64,
        command: UpdateWhoReferenceCommand,
    ) -> Result<WhoReference, WhoReferenceError> {
        info!("Updating WHO reference {}", reference_id);

        if let Some(month_age) = command.month_age {
            validate_month_age(month_age)?;
        }
        if let Some(height) = command.height_median_cm {
            validate_height(height)?;
        }
        if let Some(weight) = command.weight_median_kg {
            validate_weight(weight)?;
        }

        let mut reference = self
            .reference_repository
            .get_reference(reference_id)
            .await?
            .ok_or(WhoReferenceError::NotFound(reference_id))?;

        reference.gender = command.gender.unwrap_or(reference.gender);
        reference.month_age = command.month_age.unwrap_or(reference.month_age);
        reference.height_median_cm = command.height_median_cm.unwrap_or(reference.height_median_cm);
        reference.weight_median_kg = command.weight_median_kg.unwrap_or(reference.weight_median_kg);
        reference.updated_at = now_timestamp();

        self.reference_repository.update_reference(&reference).await?;
        Ok(reference)
    }

    pub async fn delete_reference(&self, reference_id: i64) -> Result<(), WhoReferenceError> {
        info!("Deleting WHO reference {}", reference_id);

        if self.reference_repository.delete_reference(reference_id).await? {
            Ok(())
        } else {
            warn!("WHO reference not found for deletion: {}", reference_id);
            Err(WhoReferenceError::NotFound(reference_id))
        }
    }
}
