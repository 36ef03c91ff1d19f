//! backend/src/domain/models/who_reference.rs

use chrono::{DateTime, Utc};

use super::baby::Gender;
use super::measurement::{validate_height, validate_month_age, validate_weight, MeasurementValidationError};

/// WHO median height and weight for one gender at one month-age.
/// At most one row exists per `(gender, month_age)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhoReference {
    pub id: i64,
    pub gender: Gender,
    pub month_age: i64,
    pub height_median_cm: f64,
    pub weight_median_kg: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a reference row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewWhoReference {
    pub gender: Gender,
    pub month_age: i64,
    pub height_median_cm: f64,
    pub weight_median_kg: f64,
}

impl NewWhoReference {
    pub fn new(
        gender: Gender,
        month_age: i64,
        height_median_cm: f64,
        weight_median_kg: f64,
    ) -> Result<Self, MeasurementValidationError> {
        validate_month_age(month_age)?;
        validate_height(height_median_cm)?;
        validate_weight(weight_median_kg)?;
        Ok(Self {
            gender,
            month_age,
            height_median_cm,
            weight_median_kg,
        })
    }
}
