//! Commands accepted by the baby service.

use crate::domain::models::baby::Gender;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBabyCommand {
    pub name: String,
    pub gender: Gender,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub birth_date: String,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBabyCommand {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
}
