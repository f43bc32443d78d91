//! HTTP server setup and lifecycle.
//!
//! Configures the axum server with:
//! - Karaoke operation and subscription handlers
//! - Health, readiness and metrics endpoints
//! - Graceful shutdown that closes every open subscription

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::bus::Bus;
use crate::config::Config;
use crate::error::ServerError;
use crate::observability::metrics::init_metrics;
use crate::service::{create_router, AppState};

/// Run the Lyricbus HTTP server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when the server has shut down.
pub async fn run_server(
    config: Config,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    if config.metrics {
        init_metrics();
    }

    // The bus lives exactly as long as the server
    let bus = Bus::new(config.queue_policy());

    let listener = TcpListener::bind(addr).await?;
    serve(listener, bus, shutdown_rx).await
}

/// Serve on an already bound listener until `shutdown_rx` fires.
///
/// On shutdown every subscription on `bus` is closed so open event streams
/// end and their connections can drain.
pub async fn serve(
    listener: TcpListener,
    bus: Bus,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let local_addr = listener.local_addr()?;
    let policy = bus.policy();
    let app = create_router(AppState::new(bus.clone()));

    tracing::info!(
        address = %local_addr,
        queue_capacity = policy.capacity,
        overflow = ?policy.overflow,
        "Starting Lyricbus HTTP server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // Wait for shutdown signal
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");

            // Subscriptions opened from here on end immediately
            let closed = bus.close_all();
            tracing::info!(closed, "Closed active subscriptions");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
