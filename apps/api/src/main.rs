mod config;
mod errors;
mod ranking;
mod routes;
mod similarity;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::ranking::service::RankingService;
use crate::routes::build_router;
use crate::similarity::HttpSimilarityClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Ranker API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize similarity provider (the only outbound dependency)
    let provider = HttpSimilarityClient::new(&config)?;
    info!(
        "Similarity client initialized (url: {}, scale: {}, timeout: {:?}, attempts: {})",
        config.similarity_api_url,
        config.similarity_scale,
        config.provider_timeout,
        config.provider_max_attempts
    );

    // Per-resume bound spans every adapter attempt, so timed-out attempts can be retried.
    let call_budget = provider.call_budget();
    info!("Per-resume scoring budget: {call_budget:?}");

    let ranker = RankingService::new(
        Arc::new(provider),
        config.max_concurrent_scoring,
        call_budget,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        ranker: Arc::new(ranker),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C. In-flight ranking requests are allowed to finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
