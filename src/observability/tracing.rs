//! Tracing setup.
//!
//! Configures structured logging with:
//! - Environment-based filter (via RUST_LOG or `--log-level`)
//! - Human-readable or JSON line output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Build the filter from a directive string such as `info` or
/// `warn,lyricbus=debug`.
fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info,lyricbus=debug"))
}

/// Initialize tracing.
///
/// This sets up:
/// - Console logging with structured format
/// - Filter directives from `log_level`
///
/// Subsequent calls are ignored.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = build_filter(log_level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
    };

    if result.is_ok() {
        tracing::info!(log_level, ?format, "Tracing initialized");
    }
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
