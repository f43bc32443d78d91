//! Lyricbus: karaoke lyrics requests with live notifications.
//!
//! # Usage
//!
//! ```bash
//! lyricbus --port 4000 --queue-capacity 256 --overflow drop-oldest
//! ```
//!
//! Environment variables can also be used:
//! - `LYRICBUS_PORT`: Port to listen on
//! - `LYRICBUS_QUEUE_CAPACITY`: Events buffered per subscriber
//! - `LYRICBUS_OVERFLOW`: drop-oldest, drop-newest or unbounded
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use lyricbus::config::Config;
use lyricbus::observability::tracing::init_tracing;
use lyricbus::server::run_server;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
   _            _      _               
  | |_   _ _ __(_) ___| |__  _   _ ___ 
  | | | | | '__| |/ __| '_ \| | | / __|
  | | |_| | |  | | (__| |_) | |_| \__ \
  |_|\__, |_|  |_|\___|_.__/ \__,_|___/
     |___/                             

  Lyricbus v{} - Karaoke Notification Service

  Configuration:
    Address:    {}:{}
    Queue:      {} events per subscriber ({:?})
    Metrics:    {}
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.queue_capacity,
        config.overflow,
        if config.metrics { "enabled" } else { "disabled" },
        config.log_level
    );
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn wait_for_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = ctrl_c => {
                result?;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await?;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Initialize tracing/logging
    init_tracing(&config.log_level, config.log_format);

    // Print startup banner
    print_banner(&config);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signals");
        }
        // Signal shutdown
        let _ = shutdown_tx.send(true);
    });

    // Run the server
    run_server(config, shutdown_rx).await?;

    tracing::info!("Lyricbus shutdown complete");
    Ok(())
}
