//! # SQLite Storage Module
//!
//! SQLite-backed implementation of the storage traits using SQLx.
//!
//! ## Components
//!
//! - **connection.rs** - pool management and schema setup
//! - **repositories/** - one repository per aggregate, the WHO reference table
//!   and the import repository

pub mod connection;
pub mod repositories;

pub use connection::DbConnection;
pub use repositories::{
    BabyRepository, ImportRepository, MeasurementRepository, UserRepository, WhoReferenceRepository,
};
