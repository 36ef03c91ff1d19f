//! # REST API Interface Layer
//!
//! HTTP endpoints for the baby growth tracker. This layer handles:
//! - resolving the caller from the identity header
//! - JSON and multipart request decoding
//! - translating domain errors into status codes with `{ "error": ... }` bodies
//! - request logging
//!
//! Handlers hold no business logic; they call a domain service and map the
//! result.

pub mod account_apis;
pub mod baby_apis;
pub mod export_apis;
pub mod identity;
pub mod import_apis;
pub mod mappers;
pub mod measurement_apis;
pub mod who_reference_apis;

pub use identity::CurrentUser;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;

/// JSON error body with the given status
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
