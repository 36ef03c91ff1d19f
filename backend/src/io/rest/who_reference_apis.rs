//! # REST API for WHO Reference Data
//!
//! The WHO median table babies are charted against. Rows are shared by all
//! users; every endpoint still requires an identified caller.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use shared::{
    CreateWhoReferenceRequest, DeleteResponse, UpdateWhoReferenceRequest, WhoReference, WhoReferenceQuery,
};
use tracing::{error, info, warn};

use super::mappers::WhoReferenceMapper;
use super::{error_response, CurrentUser};
use crate::domain::WhoReferenceError;
use crate::AppState;

/// Create a router for WHO reference APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_references).post(create_reference))
        .route("/:id", patch(update_reference).delete(delete_reference))
}

fn reference_error_response(e: WhoReferenceError) -> Response {
    match e {
        WhoReferenceError::Validation(reason) => {
            warn!("Rejected WHO reference payload: {}", reason);
            error_response(StatusCode::BAD_REQUEST, "Invalid payload")
        }
        WhoReferenceError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Not found"),
        WhoReferenceError::DuplicateReference { gender, month_age } => {
            warn!("Duplicate monthAge {} for {}", month_age, gender);
            error_response(StatusCode::CONFLICT, "Duplicate monthAge for this gender")
        }
        WhoReferenceError::Storage(e) => {
            error!("WHO reference storage failure: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// List reference rows ordered by gender then month-age
pub async fn list_references(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WhoReferenceQuery>,
) -> impl IntoResponse {
    info!("GET /api/who-data - user: {}, gender: {:?}", user.user_id, query.gender);

    let gender = WhoReferenceMapper::to_gender_filter(query.gender.as_deref());
    match state.who_reference_service.list_references(gender).await {
        Ok(references) => {
            let references: Vec<WhoReference> =
                references.into_iter().map(WhoReferenceMapper::to_dto).collect();
            (StatusCode::OK, Json(references)).into_response()
        }
        Err(e) => reference_error_response(e),
    }
}

pub async fn create_reference(
    State(state): State<AppState>,
    _user: CurrentUser,
    payload: Result<Json<CreateWhoReferenceRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = payload else {
        warn!("POST /api/who-data - unreadable payload");
        return error_response(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    info!("POST /api/who-data - request: {:?}", request);

    let command = WhoReferenceMapper::to_create_command(request);
    match state.who_reference_service.create_reference(command).await {
        Ok(reference) => (StatusCode::CREATED, Json(WhoReferenceMapper::to_dto(reference))).into_response(),
        Err(e) => reference_error_response(e),
    }
}

pub async fn update_reference(
    State(state): State<AppState>,
    _user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateWhoReferenceRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Path(reference_id)) = id else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid id");
    };
    let Ok(Json(request)) = payload else {
        warn!("PATCH /api/who-data/{} - unreadable payload", reference_id);
        return error_response(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    info!("PATCH /api/who-data/{} - request: {:?}", reference_id, request);

    let command = WhoReferenceMapper::to_update_command(request);
    match state
        .who_reference_service
        .update_reference(reference_id, command)
        .await
    {
        Ok(reference) => (StatusCode::OK, Json(WhoReferenceMapper::to_dto(reference))).into_response(),
        Err(e) => reference_error_response(e),
    }
}

pub async fn delete_reference(
    State(state): State<AppState>,
    _user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let Ok(Path(reference_id)) = id else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid id");
    };
    info!("DELETE /api/who-data/{}", reference_id);

    match state.who_reference_service.delete_reference(reference_id).await {
        Ok(()) => (StatusCode::OK, Json(DeleteResponse { ok: true })).into_response(),
        Err(e) => reference_error_response(e),
    }
}
