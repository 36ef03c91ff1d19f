use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use baby_growth_backend::config::AppConfig;
use baby_growth_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind_address = config.bind_address.clone();
    let app_state = initialize_backend(config).await?;
    let app = create_router(app_state);

    info!("Starting server on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
