//! Caller identity.
//!
//! Authentication happens in front of this service; the proxy forwards the
//! authenticated email in a configurable header. The extractor maps it to a
//! user id, optionally provisioning unknown users.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Response,
};
use tracing::{error, info, warn};

use super::error_response;
use crate::storage::traits::{Connection, UserStorage};
use crate::AppState;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
    pub email: String,
}

fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Unauthorized")
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(state.config.identity_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string);

        let Some(email) = email else {
            warn!("Request to {} without identity header", parts.uri.path());
            return Err(unauthorized());
        };

        let users = state.connection.create_user_repository();
        match users.find_user_id_by_email(&email).await {
            Ok(Some(user_id)) => Ok(CurrentUser { user_id, email }),
            Ok(None) if state.config.auto_provision_users => {
                info!("Provisioning user {}", email);
                match users.create_user(&email).await {
                    Ok(user_id) => Ok(CurrentUser { user_id, email }),
                    // A concurrent request may have created the same user
                    Err(e) => match users.find_user_id_by_email(&email).await {
                        Ok(Some(user_id)) => Ok(CurrentUser { user_id, email }),
                        _ => {
                            error!("Failed to provision user {}: {}", email, e);
                            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
                        }
                    },
                }
            }
            Ok(None) => {
                warn!("Unknown user {}", email);
                Err(unauthorized())
            }
            Err(e) => {
                error!("Failed to look up user {}: {}", email, e);
                Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
            }
        }
    }
}
