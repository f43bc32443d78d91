//! Lyricbus: a karaoke lyrics notification service.
//!
//! Clients request that lyrics be sourced for a song, submit lyrics they
//! found, and subscribe to live notifications of both. Notifications travel
//! over an in-process topic bus with per-subscriber queues and optional
//! predicate filters.
//!
//! # Architecture
//!
//! - **Explicit bus context**: [`bus::Bus`] is created at startup and passed
//!   down; there is no process-wide singleton
//! - **Snapshot fan-out**: publishers never wait on consumers
//! - **Bounded queues**: overflow policy is configuration, drops are counted
//! - **HTTP + SSE**: operations over JSON, subscriptions as event streams
//!
//! # Modules
//!
//! - [`bus`]: Topic registry, subscriber channels, dispatch and filters
//! - [`config`]: CLI and environment configuration
//! - [`error`]: Server error type
//! - [`karaoke`]: Songs, topics and the karaoke operations
//! - [`observability`]: Metrics and tracing setup
//! - [`server`]: HTTP server setup and lifecycle
//! - [`service`]: HTTP handlers

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // karaoke::KaraokeError is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod bus;
pub mod config;
pub mod error;
pub mod karaoke;
pub mod observability;
pub mod server;
pub mod service;

/// Get the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is set before the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
