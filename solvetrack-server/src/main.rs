//! SolveTrack backend
//!
//! REST API for a personal coding-practice tracker: solved problems with
//! their difficulty/language/tag vocabularies, daily practice summaries,
//! derived analytics, and bio-based verification of external profiles.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solvetrack_server::{routes, AppState, Config, HttpProfileFetcher, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solvetrack_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    // Open the database
    let store = SqliteStore::open(&config.database_path)?;
    tracing::info!(path = %config.database_path, "Opened database");

    // Create app state
    let state = Arc::new(AppState::new(
        store,
        HttpProfileFetcher::new(config.profile_endpoint.clone()),
    ));

    // Create router
    let app = routes::create_router(state).layer(routes::cors_layer(&config.cors_origins));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Tracker API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
