//! # Storage Module
//!
//! Handles all data persistence for the baby growth tracker.
//!
//! The domain layer only sees the traits in [`traits`]; the SQLite
//! implementation lives in [`sqlite`] and can be swapped without touching
//! services or handlers.
//!
//! ## Key Responsibilities
//!
//! - **User-scoped access**: every query is filtered by the owning user id
//! - **Uniqueness**: one measurement per `(baby_id, month_age)`, surfaced as
//!   [`StorageError::DuplicateMeasurement`]
//! - **Atomic replace**: the replace-mode import runs inside one transaction

pub mod sqlite;
pub mod traits;

pub use sqlite::DbConnection;
pub use traits::*;
