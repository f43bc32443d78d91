//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing with text or JSON output
//! - Prometheus metrics for publish, delivery and subscriptions
//! - HTTP endpoints for Prometheus scraping and health checks

pub mod metrics;
pub mod prometheus;
pub mod tracing;
