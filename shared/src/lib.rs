use serde::{Deserialize, Serialize};
use std::fmt;

/// Biological sex used to pick the WHO reference curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "MALE"),
            Gender::Female => write!(f, "FEMALE"),
        }
    }
}

/// Represents a baby tracked by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baby {
    pub id: i64,
    pub name: String,
    pub gender: Gender,
    pub birth_date: String, // ISO 8601 date format (YYYY-MM-DD)
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Request for creating a new baby
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBabyRequest {
    pub name: String,
    pub gender: Gender,
    pub birth_date: String,
}

/// Request for updating an existing baby; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBabyRequest {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
}

/// A single height/weight measurement for a baby at a given month-age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: i64,
    pub baby_id: i64,
    pub month_age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Request for recording a new measurement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeasurementRequest {
    pub baby_id: i64,
    pub month_age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// Request for updating a measurement; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeasurementRequest {
    pub baby_id: Option<i64>,
    pub month_age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

/// WHO median height and weight for one gender at one month-age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoReference {
    pub id: i64,
    pub gender: Gender,
    pub month_age: i64,
    pub height_median_cm: f64,
    pub weight_median_kg: f64,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Request for adding a WHO reference row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWhoReferenceRequest {
    pub gender: Gender,
    pub month_age: i64,
    pub height_median_cm: f64,
    pub weight_median_kg: f64,
}

/// Request for updating a WHO reference row; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWhoReferenceRequest {
    pub gender: Option<Gender>,
    pub month_age: Option<i64>,
    pub height_median_cm: Option<f64>,
    pub weight_median_kg: Option<f64>,
}

/// Query string of the WHO reference listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WhoReferenceQuery {
    /// `male` or `female` in any case; other values list every row
    pub gender: Option<String>,
}

/// Merge policy applied when importing an archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Merge into existing records, never deleting anything
    #[default]
    Append,
    /// Delete all existing records before recreating them from the archive
    Replace,
}

impl ImportMode {
    /// Parse the multipart `mode` field. Anything other than `replace` means append.
    pub fn from_form_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("replace") => ImportMode::Replace,
            _ => ImportMode::Append,
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Append => write!(f, "append"),
            ImportMode::Replace => write!(f, "replace"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BabyImportStats {
    pub created: u32,
    /// Babies deleted before recreation; always zero in append mode
    pub removed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataImportStats {
    pub created: u32,
    pub updated: u32,
    /// Measurements whose baby name matched no baby
    pub skipped: u32,
}

/// Summary of a completed import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub mode: ImportMode,
    pub babies: BabyImportStats,
    pub data: DataImportStats,
}

impl ImportStats {
    pub fn new(mode: ImportMode) -> Self {
        Self {
            mode,
            babies: BabyImportStats::default(),
            data: DataImportStats::default(),
        }
    }
}

/// Response after a successful import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub ok: bool,
    pub stats: ImportStats,
}

/// Response after deleting a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}
