//! # REST API for Data Import
//!
//! Accepts an archive produced by the export endpoint as a multipart upload
//! with a `file` field and an optional `mode` field (`append` or `replace`).

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use shared::{ImportMode, ImportResponse};
use tracing::{debug, error, info, warn};

use super::{error_response, CurrentUser};
use crate::domain::ImportError;
use crate::AppState;

/// Create a router for import related APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/all", post(import_all))
}

/// The fields of an import upload
#[derive(Debug, Default)]
struct ImportUpload {
    file: Option<Vec<u8>>,
    mode: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<ImportUpload, MultipartError> {
    let mut upload = ImportUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => upload.file = Some(field.bytes().await?.to_vec()),
            Some("mode") => upload.mode = Some(field.text().await?),
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }
    Ok(upload)
}

fn import_error_response(e: ImportError) -> Response {
    match e {
        ImportError::InvalidArchive(reason) => {
            warn!("Rejected import archive: {}", reason);
            error_response(StatusCode::BAD_REQUEST, "Invalid zip file")
        }
        ImportError::MissingEntries => {
            error_response(StatusCode::BAD_REQUEST, "Missing babies.csv or baby-data.csv")
        }
        ImportError::Storage(e) => {
            error!("Import failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Import failed")
        }
    }
}

/// Import an archive under the requested merge mode
pub async fn import_all(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    info!("POST /api/import/all - user: {}", user.user_id);

    let Ok(multipart) = multipart else {
        warn!("Import request is not multipart form data");
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Failed to read import upload: {}", e);
            let status = e.status();
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "File too large"
            } else {
                "Invalid form data"
            };
            return error_response(status, message);
        }
    };

    let mode = ImportMode::from_form_value(upload.mode.as_deref());
    let Some(file) = upload.file else {
        warn!("Import request without a file field");
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    match state.import_service.import_archive(user.user_id, &file, mode).await {
        Ok(stats) => (StatusCode::OK, Json(ImportResponse { ok: true, stats })).into_response(),
        Err(e) => import_error_response(e),
    }
}
