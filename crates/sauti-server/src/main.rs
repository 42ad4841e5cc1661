//! Sauti TTS Server - HTTP API for the resident speech engine

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sauti_core::engine::bridge::DaemonBridge;
use sauti_core::{EngineConfig, ServerConfig, SpeechService};
use sauti_server::api;
use sauti_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sauti_server=debug,sauti_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sauti TTS Server");

    // Load configuration
    let engine_config = EngineConfig::from_env();
    let server_config = ServerConfig::from_env();
    info!(
        "Device: {}, idle timeout: {}s, sweep period: {}s",
        engine_config.device, engine_config.idle_timeout_secs, engine_config.sweep_period_secs
    );

    // Create the speech service with the daemon-bridge backend
    let backend = Arc::new(DaemonBridge::new(&engine_config));
    let service = SpeechService::new(engine_config, backend)?;
    let state = AppState::new(service);

    info!("Speech service initialized");

    // Build router
    let app = api::create_router(state.clone());

    // Start server
    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    info!("Server ready. Press Ctrl+C to stop.");
    server.await?;

    // Stop the idle sweeper and release the device before exiting.
    state.service.shutdown().await;

    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}
