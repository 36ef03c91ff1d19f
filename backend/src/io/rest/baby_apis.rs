//! # REST API for Baby Management
//!
//! Endpoints for listing, creating, updating, and deleting the caller's babies.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use shared::{Baby, CreateBabyRequest, DeleteResponse, UpdateBabyRequest};
use tracing::{error, info, warn};

use super::mappers::BabyMapper;
use super::{error_response, CurrentUser};
use crate::domain::BabyError;
use crate::AppState;

/// Create a router for baby related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_babies).post(create_baby))
        .route("/:id", patch(update_baby).delete(delete_baby))
}

fn baby_error_response(e: BabyError, failure: &str) -> Response {
    match e {
        BabyError::Validation(reason) => {
            warn!("Rejected baby payload: {}", reason);
            error_response(StatusCode::BAD_REQUEST, "Invalid payload")
        }
        BabyError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Not found"),
        BabyError::Storage(e) => {
            error!("{}: {:#}", failure, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, failure)
        }
    }
}

/// List the caller's babies, newest first
pub async fn list_babies(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/babies - user: {}", user.user_id);

    match state.baby_service.list_babies(user.user_id).await {
        Ok(babies) => {
            let babies: Vec<Baby> = babies.into_iter().map(BabyMapper::to_dto).collect();
            (StatusCode::OK, Json(babies)).into_response()
        }
        Err(e) => baby_error_response(e, "List failed"),
    }
}

/// Create a baby
pub async fn create_baby(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateBabyRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = payload else {
        warn!("POST /api/babies - unreadable payload");
        return error_response(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    info!("POST /api/babies - request: {:?}", request);

    let command = BabyMapper::to_create_command(request);
    match state.baby_service.create_baby(user.user_id, command).await {
        Ok(baby) => (StatusCode::CREATED, Json(BabyMapper::to_dto(baby))).into_response(),
        Err(e) => baby_error_response(e, "Create failed"),
    }
}

/// Partially update a baby
pub async fn update_baby(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateBabyRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Path(baby_id)) = id else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid id");
    };
    let Ok(Json(request)) = payload else {
        warn!("PATCH /api/babies/{} - unreadable payload", baby_id);
        return error_response(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    info!("PATCH /api/babies/{} - request: {:?}", baby_id, request);

    let command = BabyMapper::to_update_command(request);
    match state.baby_service.update_baby(user.user_id, baby_id, command).await {
        Ok(baby) => (StatusCode::OK, Json(BabyMapper::to_dto(baby))).into_response(),
        Err(e) => baby_error_response(e, "Update failed"),
    }
}

/// Delete a baby and its measurements
pub async fn delete_baby(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let Ok(Path(baby_id)) = id else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid id");
    };
    info!("DELETE /api/babies/{}", baby_id);

    match state.baby_service.delete_baby(user.user_id, baby_id).await {
        Ok(()) => (StatusCode::OK, Json(DeleteResponse { ok: true })).into_response(),
        Err(e) => baby_error_response(e, "Delete failed"),
    }
}
