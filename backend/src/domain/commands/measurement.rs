//! Commands accepted by the measurement service.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateMeasurementCommand {
    pub baby_id: i64,
    pub month_age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// Partial update; `None` leaves a field unchanged. Setting `baby_id` moves
/// the measurement to another baby of the same user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateMeasurementCommand {
    pub baby_id: Option<i64>,
    pub month_age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}
