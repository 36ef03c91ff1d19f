//! backend/src/domain/models/measurement.rs

use chrono::{DateTime, Utc};

pub const MIN_MONTH_AGE: i64 = 0;
pub const MAX_MONTH_AGE: i64 = 240;

/// Domain model for one height/weight reading. At most one exists per
/// `(baby_id, month_age)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: i64,
    pub baby_id: i64,
    pub month_age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A measurement joined with the name of the baby it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub measurement: Measurement,
    pub baby_name: String,
}

/// Height and weight at a month-age, before a baby id is attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthValues {
    pub month_age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl GrowthValues {
    pub fn new(month_age: i64, height_cm: f64, weight_kg: f64) -> Result<Self, MeasurementValidationError> {
        validate_month_age(month_age)?;
        validate_height(height_cm)?;
        validate_weight(weight_kg)?;
        Ok(Self {
            month_age,
            height_cm,
            weight_kg,
        })
    }
}

/// Fields needed to create a measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewMeasurement {
    pub baby_id: i64,
    pub values: GrowthValues,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeasurementValidationError {
    #[error("Month age must be between 0 and 240")]
    InvalidMonthAge,
    #[error("Height must be a positive number")]
    InvalidHeight,
    #[error("Weight must be a positive number")]
    InvalidWeight,
}

pub fn validate_month_age(month_age: i64) -> Result<(), MeasurementValidationError> {
    if (MIN_MONTH_AGE..=MAX_MONTH_AGE).contains(&month_age) {
        Ok(())
    } else {
        Err(MeasurementValidationError::InvalidMonthAge)
    }
}

fn validate_positive(value: f64, error: MeasurementValidationError) -> Result<(), MeasurementValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(error)
    }
}

pub fn validate_height(height_cm: f64) -> Result<(), MeasurementValidationError> {
    validate_positive(height_cm, MeasurementValidationError::InvalidHeight)
}

pub fn validate_weight(weight_kg: f64) -> Result<(), MeasurementValidationError> {
    validate_positive(weight_kg, MeasurementValidationError::InvalidWeight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_values_bounds() {
        assert!(GrowthValues::new(0, 50.0, 3.2).is_ok());
        assert!(GrowthValues::new(240, 180.0, 70.0).is_ok());
        assert_eq!(
            GrowthValues::new(-1, 50.0, 3.2),
            Err(MeasurementValidationError::InvalidMonthAge)
        );
        assert_eq!(
            GrowthValues::new(241, 50.0, 3.2),
            Err(MeasurementValidationError::InvalidMonthAge)
        );
        assert_eq!(
            GrowthValues::new(3, 0.0, 3.2),
            Err(MeasurementValidationError::InvalidHeight)
        );
        assert_eq!(
            GrowthValues::new(3, 60.0, -1.0),
            Err(MeasurementValidationError::InvalidWeight)
        );
        assert_eq!(
            GrowthValues::new(3, f64::NAN, 5.0),
            Err(MeasurementValidationError::InvalidHeight)
        );
    }
}
