//! Configuration parsing for the Lyricbus server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::{ArgAction, Parser};

use crate::bus::{Overflow, QueuePolicy};
use crate::observability::tracing::LogFormat;

/// Lyricbus: karaoke lyrics requests and live notifications.
#[derive(Parser, Debug, Clone)]
#[command(name = "lyricbus")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "LYRICBUS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "LYRICBUS_PORT", default_value_t = 4000)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error) or filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LYRICBUS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Maximum queued events per subscriber
    #[arg(long, env = "LYRICBUS_QUEUE_CAPACITY", default_value_t = QueuePolicy::DEFAULT_CAPACITY)]
    pub queue_capacity: usize,

    /// What a full subscriber queue does with new events
    #[arg(long, env = "LYRICBUS_OVERFLOW", value_enum, default_value_t = Overflow::DropOldest)]
    pub overflow: Overflow,

    /// Serve Prometheus metrics on /metrics
    #[arg(long, env = "LYRICBUS_METRICS", action = ArgAction::Set, default_value_t = true)]
    pub metrics: bool,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Queue policy for new subscriptions.
    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy::bounded(self.queue_capacity, self.overflow)
    }

    /// Create a default configuration for testing.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            log_level: "debug".into(),
            log_format: LogFormat::Text,
            queue_capacity: 16,
            overflow: Overflow::DropOldest,
            metrics: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 4000,
            log_level: "info".into(),
            log_format: LogFormat::Text,
            queue_capacity: QueuePolicy::DEFAULT_CAPACITY,
            overflow: Overflow::DropOldest,
            metrics: true,
        }
    }
}
