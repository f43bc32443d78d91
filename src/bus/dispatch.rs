//! Publish fan-out.
//!
//! A publish copies the topic's subscriber set and pushes one event copy
//! into each channel. Subscribers joining after the copy miss the event;
//! subscribers closed before their push see nothing, and filtered
//! subscribers see only what their predicate accepts. Pushes never suspend,
//! so per-subscriber publish order is the order of `publish` calls.

use serde::Serialize;

use super::channel::PushOutcome;
use super::registry::TopicRegistry;
use super::{Event, Payload};
use crate::observability::metrics::record_publish;

/// Delivery counts for one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Events lost to overflow (the new one or an evicted older one).
    pub dropped: usize,
    /// Subscribers that closed between the snapshot and delivery.
    pub closed: usize,
    /// Subscribers whose predicate rejected the event.
    pub filtered: usize,
}

/// Deliver `payload` to every subscriber currently on `topic`.
pub fn dispatch(registry: &TopicRegistry, topic: &str, payload: Payload) -> PublishReport {
    let subscribers = registry.snapshot(topic);
    let mut report = PublishReport::default();

    if subscribers.is_empty() {
        tracing::trace!(topic, "No subscribers, event discarded");
        record_publish(topic, &report);
        return report;
    }

    let event = Event::new(topic, payload);
    for channel in &subscribers {
        match channel.push(event.clone()) {
            PushOutcome::Enqueued => report.delivered += 1,
            PushOutcome::DroppedOldest => {
                report.delivered += 1;
                report.dropped += 1;
            }
            PushOutcome::DroppedNewest => report.dropped += 1,
            PushOutcome::Filtered => report.filtered += 1,
            PushOutcome::Closed => report.closed += 1,
        }
    }

    if report.dropped > 0 {
        tracing::warn!(
            topic,
            dropped = report.dropped,
            "Subscriber queues full, events dropped"
        );
    }

    tracing::trace!(
        topic,
        delivered = report.delivered,
        filtered = report.filtered,
        closed = report.closed,
        "Event dispatched"
    );
    record_publish(topic, &report);
    report
}
