//! Mockwarden HTTP Server
//!
//! Main entry point for the mock API server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use infrastructure::{AppConfig, ChaosEngine, RecordingEngine, create_storage, init_tracing};
use presentation_http::{routes, state::AppState};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration before tracing so the log filter can come from it
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_tracing(&config.telemetry)?;

    info!("Mockwarden v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {}", e);
    }

    info!(
        host = %config.server.host,
        port = %config.server.port,
        scenarios = config.chaos.scenarios.len(),
        mock_routes = config.server.routes.len(),
        recording = config.recording.enabled,
        "Configuration loaded"
    );

    // Chaos engine
    let chaos = Arc::new(ChaosEngine::new());
    chaos.load_scenarios(&config.chaos.scenarios);

    // Recording engine
    let storage = create_storage(&config.recording.storage, config.recording.max_recordings).await?;
    let recording = Arc::new(RecordingEngine::new(Arc::clone(&storage)));
    recording.start(&config.recording)?;

    let addr = config.bind_address();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));

    let state = AppState::new(config, Arc::clone(&chaos), Arc::clone(&recording));
    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("Admin API: http://{}/__admin/recordings", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
    .await?;

    chaos.stop();
    recording.stop();
    if let Err(e) = storage.close().await {
        warn!(error = %e, "Failed to close recording storage");
    }

    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    info!("Waiting up to {:?} for connections to close...", timeout);
}
