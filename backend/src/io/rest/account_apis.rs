//! # REST API for the Caller's Account

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::delete,
    Router,
};
use shared::DeleteResponse;
use tracing::{error, info};

use super::{error_response, CurrentUser};
use crate::domain::AccountError;
use crate::AppState;

/// Create a router for account related APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/", delete(delete_account))
}

/// Delete the caller's account; babies and measurements go with it
pub async fn delete_account(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("DELETE /api/account - user: {} ({})", user.user_id, user.email);

    match state.account_service.delete_account(user.user_id).await {
        Ok(()) => (StatusCode::OK, Json(DeleteResponse { ok: true })).into_response(),
        Err(AccountError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(AccountError::Storage(e)) => {
            error!("Failed to delete account {}: {:#}", user.user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Delete failed")
        }
    }
}
