//! Prometheus metrics.
//!
//! Key metrics:
//! - lyricbus_events_published_total: Counter of publish calls per topic
//! - lyricbus_events_delivered_total: Counter of event copies queued
//! - lyricbus_events_dropped_total: Counter of events lost to queue overflow
//! - lyricbus_events_filtered_total: Counter of copies rejected by predicates
//! - lyricbus_subscriptions_active: Gauge of live subscriptions per topic
//!
//! Recording helpers are no-ops until [`init_metrics`] has been called, so
//! the bus can be used without a metrics registry.

use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};
use std::sync::OnceLock;

use crate::bus::PublishReport;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Lyricbus metrics registry.
pub struct Metrics {
    registry: Registry,
    /// Total number of publish calls.
    pub events_published: IntCounterVec,
    /// Total number of event copies accepted by subscriber queues.
    pub events_delivered: IntCounterVec,
    /// Total number of events dropped because a queue was full.
    pub events_dropped: IntCounterVec,
    /// Total number of event copies rejected by subscription predicates.
    pub events_filtered: IntCounterVec,
    /// Live subscriptions.
    pub subscriptions_active: IntGaugeVec,
}

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_published = IntCounterVec::new(
            Opts::new("lyricbus_events_published_total", "Total number of publish calls"),
            &["topic"],
        )?;
        let events_delivered = IntCounterVec::new(
            Opts::new(
                "lyricbus_events_delivered_total",
                "Event copies accepted by subscriber queues",
            ),
            &["topic"],
        )?;
        let events_dropped = IntCounterVec::new(
            Opts::new(
                "lyricbus_events_dropped_total",
                "Events dropped because a subscriber queue was full",
            ),
            &["topic"],
        )?;
        let events_filtered = IntCounterVec::new(
            Opts::new(
                "lyricbus_events_filtered_total",
                "Event copies rejected by subscription predicates",
            ),
            &["topic"],
        )?;
        let subscriptions_active = IntGaugeVec::new(
            Opts::new("lyricbus_subscriptions_active", "Live subscriptions per topic"),
            &["topic"],
        )?;

        registry.register(Box::new(events_published.clone()))?;
        registry.register(Box::new(events_delivered.clone()))?;
        registry.register(Box::new(events_dropped.clone()))?;
        registry.register(Box::new(events_filtered.clone()))?;
        registry.register(Box::new(subscriptions_active.clone()))?;

        Ok(Self {
            registry,
            events_published,
            events_delivered,
            events_dropped,
            events_filtered,
            subscriptions_active,
        })
    }
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
pub fn init_metrics() {
    if METRICS.get().is_some() {
        return;
    }

    match Metrics::new() {
        Ok(metrics) => {
            // Losing a concurrent init race is fine
            let _ = METRICS.set(metrics);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create metrics registry, metrics disabled");
        }
    }
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Registry to serve on `/metrics`. Empty if metrics are not initialized.
pub fn prometheus_registry() -> Registry {
    METRICS
        .get()
        .map(|m| m.registry.clone())
        .unwrap_or_default()
}

/// Record the outcome of one publish.
pub fn record_publish(topic: &str, report: &PublishReport) {
    if let Some(m) = METRICS.get() {
        m.events_published.with_label_values(&[topic]).inc();
        m.events_delivered
            .with_label_values(&[topic])
            .inc_by(report.delivered as u64);
        if report.dropped > 0 {
            m.events_dropped
                .with_label_values(&[topic])
                .inc_by(report.dropped as u64);
        }
        if report.filtered > 0 {
            m.events_filtered
                .with_label_values(&[topic])
                .inc_by(report.filtered as u64);
        }
    }
}

/// Record the live subscriber count of a topic.
pub fn record_subscribers(topic: &str, count: usize) {
    if let Some(m) = METRICS.get() {
        m.subscriptions_active
            .with_label_values(&[topic])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}
