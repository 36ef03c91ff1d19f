//! Commands accepted by the WHO reference service.

use crate::domain::models::baby::Gender;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateWhoReferenceCommand {
    pub gender: Gender,
    pub month_age: i64,
    pub height_median_cm: f64,
    pub weight_median_kg: f64,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateWhoReferenceCommand {
    pub gender: Option<Gender>,
    pub month_age: Option<i64>,
    pub height_median_cm: Option<f64>,
    pub weight_median_kg: Option<f64>,
}
