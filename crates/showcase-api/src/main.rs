//! Showcase API Service
//!
//! REST API demonstrating validation, error mapping and an in-memory VM registry.

use anyhow::{Context, Result};
use showcase_api::{config::Config, create_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showcase_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Showcase API Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded - listening on {}",
        config.api_address()
    );
    info!("Sleep duration: {:?}", config.sleep_duration());
    info!("Upload limit: {} bytes", config.max_content_length);
    if config.home_path.is_none() {
        tracing::warn!("HOMEPATH is not set, /info will fail");
    }

    // Create application state
    let state = AppState::new(&config);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Showcase API listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
