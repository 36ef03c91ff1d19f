use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::measurement::{CreateMeasurementCommand, UpdateMeasurementCommand};
use crate::domain::models::measurement::{
    validate_height, validate_month_age, validate_weight, GrowthValues, Measurement,
    MeasurementValidationError, NewMeasurement,
};
use crate::storage::sqlite::connection::now_timestamp;
use crate::storage::traits::{BabyStorage, Connection, MeasurementStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum MeasurementError {
    #[error(transparent)]
    Validation(#[from] MeasurementValidationError),
    #[error("Measurement not found: {0}")]
    NotFound(i64),
    #[error("Baby {0} does not belong to the caller")]
    Forbidden(i64),
    #[error("Duplicate monthAge {month_age} for baby {baby_id}")]
    DuplicateMeasurement { baby_id: i64, month_age: i64 },
    #[error(transparent)]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for MeasurementError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(StorageError::DuplicateMeasurement { baby_id, month_age }) =
            err.downcast_ref::<StorageError>().cloned()
        {
            return MeasurementError::DuplicateMeasurement { baby_id, month_age };
        }
        MeasurementError::Storage(err)
    }
}

/// Service for recording and editing growth measurements
#[derive(Clone)]
pub struct MeasurementService<C: Connection> {
    baby_repository: C::BabyRepository,
    measurement_repository: C::MeasurementRepository,
}

impl<C: Connection> MeasurementService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            baby_repository: connection.create_baby_repository(),
            measurement_repository: connection.create_measurement_repository(),
        }
    }

    async fn ensure_owned(&self, user_id: i64, baby_id: i64) -> Result<(), MeasurementError> {
        match self.baby_repository.get_baby(user_id, baby_id).await? {
            Some(_) => Ok(()),
            None => {
                warn!("User {} does not own baby {}", user_id, baby_id);
                Err(MeasurementError::Forbidden(baby_id))
            }
        }
    }

    /// Record a measurement for one of the user's babies
    pub async fn create_measurement(
        &self,
        user_id: i64,
        command: CreateMeasurementCommand,
    ) -> Result<Measurement, MeasurementError> {
        info!(
            "Creating measurement for baby {} at month {}",
            command.baby_id, command.month_age
        );

        let values = GrowthValues::new(command.month_age, command.height_cm, command.weight_kg)?;
        self.ensure_owned(user_id, command.baby_id).await?;

        let measurement = self
            .measurement_repository
            .store_measurement(&NewMeasurement {
                baby_id: command.baby_id,
                values,
            })
            .await?;
        Ok(measurement)
    }

    /// List all of the user's measurements, latest month-age first
    pub async fn list_measurements(&self, user_id: i64) -> Result<Vec<Measurement>, MeasurementError> {
        let mut measurements: Vec<Measurement> = self
            .measurement_repository
            .list_measurements(user_id)
            .await?
            .into_iter()
            .map(|record| record.measurement)
            .collect();
        measurements.sort_by(|a, b| b.month_age.cmp(&a.month_age));

        info!("Found {} measurements for user {}", measurements.len(), user_id);
        Ok(measurements)
    }

    /// Apply a partial update, re-checking ownership when the measurement moves to another baby
    pub async fn update_measurement(
        &self,
        user_id: i64,
        measurement_id: i64,
        command: UpdateMeasurementCommand,
    ) -> Result<Measurement, MeasurementError> {
        info!("Updating measurement {} for user {}", measurement_id, user_id);

        if let Some(month_age) = command.month_age {
            validate_month_age(month_age)?;
        }
        if let Some(height_cm) = command.height_cm {
            validate_height(height_cm)?;
        }
        if let Some(weight_kg) = command.weight_kg {
            validate_weight(weight_kg)?;
        }

        let mut measurement = self
            .measurement_repository
            .get_measurement(user_id, measurement_id)
            .await?
            .ok_or(MeasurementError::NotFound(measurement_id))?;

        if let Some(baby_id) = command.baby_id {
            self.ensure_owned(user_id, baby_id).await?;
            measurement.baby_id = baby_id;
        }
        measurement.month_age = command.month_age.unwrap_or(measurement.month_age);
        measurement.height_cm = command.height_cm.unwrap_or(measurement.height_cm);
        measurement.weight_kg = command.weight_kg.unwrap_or(measurement.weight_kg);
        measurement.updated_at = now_timestamp();

        self.measurement_repository.update_measurement(&measurement).await?;
        Ok(measurement)
    }

    pub async fn delete_measurement(&self, user_id: i64, measurement_id: i64) -> Result<(), MeasurementError> {
        info!("Deleting measurement {} for user {}", measurement_id, user_id);

        if self
            .measurement_repository
            .delete_measurement(user_id, measurement_id)
            .await?
        {
            Ok(())
        } else {
            Err(MeasurementError::NotFound(measurement_id))
        }
    }
}
