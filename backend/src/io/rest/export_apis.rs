//! # REST API for Data Export
//!
//! Downloads of the caller's data: a ZIP archive with both CSV files, or
//! either CSV file on its own.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{error, info};

use super::{error_response, CurrentUser};
use crate::domain::ExportFile;
use crate::AppState;

const ZIP_CONTENT_TYPE: &str = "application/zip";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Create a router for export related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(export_all))
        .route("/babies", get(export_babies))
        .route("/baby-data", get(export_baby_data))
}

fn download(result: anyhow::Result<ExportFile>, content_type: &'static str) -> Response {
    match result {
        Ok(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("Export failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed")
        }
    }
}

/// Both CSV files packaged in one archive
pub async fn export_all(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/export/all - user: {}", user.user_id);
    download(state.export_service.export_archive(user.user_id).await, ZIP_CONTENT_TYPE)
}

/// `babies.csv` only
pub async fn export_babies(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/export/babies - user: {}", user.user_id);
    download(state.export_service.export_babies_csv(user.user_id).await, CSV_CONTENT_TYPE)
}

/// `baby-data.csv` only
pub async fn export_baby_data(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/export/baby-data - user: {}", user.user_id);
    download(
        state.export_service.export_measurements_csv(user.user_id).await,
        CSV_CONTENT_TYPE,
    )
}
