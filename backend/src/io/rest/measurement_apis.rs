//! # REST API for Growth Measurements
//!
//! Endpoints for the caller's height/weight records (`baby-data`).

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use shared::{CreateMeasurementRequest, DeleteResponse, Measurement, UpdateMeasurementRequest};
use tracing::{error, info, warn};

use super::mappers::MeasurementMapper;
use super::{error_response, CurrentUser};
use crate::domain::MeasurementError;
use crate::AppState;

/// Create a router for measurement related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_measurements).post(create_measurement))
        .route("/:id", patch(update_measurement).delete(delete_measurement))
}

fn measurement_error_response(e: MeasurementError) -> Response {
    match e {
        MeasurementError::Validation(reason) => {
            warn!("Rejected measurement payload: {}", reason);
            error_response(StatusCode::BAD_REQUEST, "Invalid payload")
        }
        MeasurementError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Not found"),
        MeasurementError::Forbidden(_) => error_response(StatusCode::FORBIDDEN, "Forbidden"),
        MeasurementError::DuplicateMeasurement { baby_id, month_age } => {
            warn!("Duplicate monthAge {} for baby {}", month_age, baby_id);
            error_response(StatusCode::CONFLICT, "Duplicate monthAge for this baby")
        }
        MeasurementError::Storage(e) => {
            error!("Measurement storage failure: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// List the caller's measurements, latest month-age first
pub async fn list_measurements(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/baby-data - user: {}", user.user_id);

    match state.measurement_service.list_measurements(user.user_id).await {
        Ok(measurements) => {
            let measurements: Vec<Measurement> =
                measurements.into_iter().map(MeasurementMapper::to_dto).collect();
            (StatusCode::OK, Json(measurements)).into_response()
        }
        Err(e) => measurement_error_response(e),
    }
}

/// Record a measurement for one of the caller's babies
pub async fn create_measurement(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateMeasurementRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = payload else {
        warn!("POST /api/baby-data - unreadable payload");
        return error_response(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    info!("POST /api/baby-data - request: {:?}", request);

    let command = MeasurementMapper::to_create_command(request);
    match state.measurement_service.create_measurement(user.user_id, command).await {
        Ok(measurement) => (StatusCode::CREATED, Json(MeasurementMapper::to_dto(measurement))).into_response(),
        Err(e) => measurement_error_response(e),
    }
}

/// Partially update a measurement
pub async fn update_measurement(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateMeasurementRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Path(measurement_id)) = id else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid id");
    };
    let Ok(Json(request)) = payload else {
        warn!("PATCH /api/baby-data/{} - unreadable payload", measurement_id);
        return error_response(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    info!("PATCH /api/baby-data/{} - request: {:?}", measurement_id, request);

    let command = MeasurementMapper::to_update_command(request);
    match state
        .measurement_service
        .update_measurement(user.user_id, measurement_id, command)
        .await
    {
        Ok(measurement) => (StatusCode::OK, Json(MeasurementMapper::to_dto(measurement))).into_response(),
        Err(e) => measurement_error_response(e),
    }
}

/// Delete a measurement
pub async fn delete_measurement(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let Ok(Path(measurement_id)) = id else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid id");
    };
    info!("DELETE /api/baby-data/{}", measurement_id);

    match state
        .measurement_service
        .delete_measurement(user.user_id, measurement_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(DeleteResponse { ok: true })).into_response(),
        Err(e) => measurement_error_response(e),
    }
}
