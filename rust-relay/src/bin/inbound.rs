//! Hookrelay inbound - Hookdeck webhook receiver.
//!
//! This binary provides a small web server that:
//! - Accepts POSTed webhooks on any path
//! - Verifies the Hookdeck signature when HOOKDECK_WEBHOOK_SECRET is set
//! - Logs the pretty-printed payload and answers `{"status":"ACCEPTED"}`

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookrelay::web::router;
use hookrelay::{AppState, ReceiverConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("inbound_server_starting");

    // Load configuration
    let config = ReceiverConfig::from_env();
    let state = AppState::new(&config);

    info!(
        port = config.port,
        signature_verification = state.verifier.is_enabled(),
        json_policy = ?state.json_policy,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    if !state.verifier.is_enabled() {
        warn!("No HOOKDECK_WEBHOOK_SECRET set, signature verification is disabled");
    }

    // Build the router
    let app = router(state).layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "inbound_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("inbound_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("inbound_server_shutting_down");
}
