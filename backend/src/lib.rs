//! # Baby Growth Backend
//!
//! Server side of the baby growth tracker: per-user records of babies and
//! their monthly height/weight measurements charted against a shared WHO
//! median table, plus a bulk export/import pipeline built on a store-only
//! ZIP container and CSV.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, identity extraction)
//!     ↓
//! Domain Layer (services, validation, export/import reconciliation)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```
//!
//! The `codec` module (CRC-32, CSV, ZIP) is pure and sits beside the layers;
//! only the domain layer uses it.

pub mod codec;
pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{
    AccountService, BabyService, ExportService, ImportService, MeasurementService, WhoReferenceService,
};
use crate::io::rest::{
    account_apis, baby_apis, export_apis, import_apis, measurement_apis, who_reference_apis,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub connection: Arc<DbConnection>,
    pub baby_service: BabyService<DbConnection>,
    pub measurement_service: MeasurementService<DbConnection>,
    pub export_service: ExportService<DbConnection>,
    pub import_service: ImportService<DbConnection>,
    pub who_reference_service: WhoReferenceService<DbConnection>,
    pub account_service: AccountService<DbConnection>,
}

impl AppState {
    /// Wire every service to one database connection
    pub fn new(config: AppConfig, connection: DbConnection) -> Self {
        let connection = Arc::new(connection);
        Self {
            config: Arc::new(config),
            baby_service: BabyService::new(connection.clone()),
            measurement_service: MeasurementService::new(connection.clone()),
            export_service: ExportService::new(connection.clone()),
            import_service: ImportService::new(connection.clone()),
            who_reference_service: WhoReferenceService::new(connection.clone()),
            account_service: AccountService::new(connection.clone()),
            connection,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let connection = DbConnection::new(&config.database_url).await?;

    info!("Setting up application state");
    Ok(AppState::new(config, connection))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("Ignoring invalid CORS origin {:?}", config.cors_origin);
            cors
        }
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(app_state.config.max_upload_bytes);

    let api_routes = Router::new()
        .nest("/babies", baby_apis::router())
        .nest("/baby-data", measurement_apis::router())
        .nest("/export", export_apis::router())
        .nest("/import", import_apis::router().layer(upload_limit))
        .nest("/who-data", who_reference_apis::router())
        .nest("/account", account_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .layer(cors_layer(&app_state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
