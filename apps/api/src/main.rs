mod config;
mod dialogue;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod sentiment;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dialogue::SessionRegistry;
use crate::generation::build_generator;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::JsonStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // Initialize JSON storage
    let store = JsonStore::open(&config.data_dir);
    store
        .init()
        .with_context(|| format!("Failed to initialize data directory {}", config.data_dir.display()))?;
    info!("Candidate records stored under {}", config.data_dir.display());

    // Pick the generator backend once
    let generator = build_generator(&config);
    info!(
        "Generator backend: {} (default language: {})",
        generator.backend(),
        config.language
    );

    let state = AppState {
        config: config.clone(),
        generator,
        store: Arc::new(store),
        sessions: SessionRegistry::default(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
