//! backend/src/domain/models/baby.rs

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

pub const MAX_NAME_LEN: usize = 50;

/// Sex used to pick the reference growth curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = BabyValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            _ => Err(BabyValidationError::InvalidGender),
        }
    }
}

/// Domain model representing a baby owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Baby {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a baby; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewBaby {
    pub name: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
}

impl NewBaby {
    /// Build a validated baby, trimming the name
    pub fn new(name: &str, gender: Gender, birth_date: NaiveDate) -> Result<Self, BabyValidationError> {
        Ok(Self {
            name: normalize_name(name)?,
            gender,
            birth_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BabyValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name cannot exceed 50 characters")]
    NameTooLong,
    #[error("Gender must be MALE or FEMALE")]
    InvalidGender,
    #[error("Birth date must be YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidBirthDate,
}

/// Trim a display name and enforce the 1..=50 character bound
pub fn normalize_name(name: &str) -> Result<String, BabyValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BabyValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(BabyValidationError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

/// Parse a birth date given either as `YYYY-MM-DD` or as a full RFC 3339 timestamp
pub fn parse_birth_date(value: &str) -> Result<NaiveDate, BabyValidationError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc).date_naive()))
        .map_err(|_| BabyValidationError::InvalidBirthDate)
}
