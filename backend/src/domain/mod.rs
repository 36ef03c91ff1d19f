//! # Domain Layer
//!
//! Business rules for the baby growth tracker:
//! - **BabyService** / **MeasurementService** - validated record management
//!   scoped to the calling user
//! - **ExportService** - CSV rendering and archive packaging
//! - **ImportService** - archive unpacking and append/replace reconciliation
//! - **WhoReferenceService** - the shared WHO median table
//! - **AccountService** - deleting the caller's account with everything it owns
//!
//! Services are generic over the storage [`Connection`](crate::storage::Connection)
//! and never touch SQL directly.

pub mod account_service;
pub mod baby_service;
pub mod commands;
pub mod export_service;
pub mod import_locks;
pub mod import_service;
pub mod measurement_service;
pub mod models;
pub mod who_reference_service;

pub use account_service::{AccountError, AccountService};
pub use baby_service::{BabyError, BabyService};
pub use export_service::{ExportFile, ExportService};
pub use import_locks::ImportLocks;
pub use import_service::{ImportError, ImportService};
pub use measurement_service::{MeasurementError, MeasurementService};
pub use who_reference_service::{WhoReferenceError, WhoReferenceService};
