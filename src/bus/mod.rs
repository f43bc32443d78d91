//! In-process topic publish/subscribe bus.
//!
//! Provides:
//! - Topic registry with lazily created topics
//! - Per-subscriber FIFO channels with explicit close
//! - Snapshot fan-out that never waits on consumers
//! - Predicate-filtered subscriptions
//!
//! The [`Bus`] is an explicitly constructed context: the server creates one
//! at startup, hands clones to its handlers and closes every subscription
//! at shutdown.

pub mod channel;
pub mod dispatch;
pub mod filter;
pub mod registry;

pub use channel::{Overflow, PushOutcome, QueuePolicy};
pub use dispatch::PublishReport;
pub use filter::{field_equals, EventFilter, FilteredSubscription, Predicate};
pub use registry::{TopicInfo, TopicRegistry};

use std::fmt;
use std::sync::Arc;

use futures::Stream;
use uuid::Uuid;

use self::channel::SubscriberChannel;
use crate::now_millis;

/// Event payload: field name to JSON value.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One published event as seen by a subscriber.
///
/// Every subscriber receives its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Topic the event was published on.
    pub topic: String,
    /// Published data.
    pub payload: Payload,
    /// Publish time in Unix milliseconds.
    pub published_at: i64,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
            published_at: now_millis(),
        }
    }
}

/// Unique identifier of a subscription (UUIDv7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live interest in one topic.
///
/// Receives only events published after it was created. Closing or dropping
/// it unregisters it from the topic; a publish racing with the close either
/// delivers before the close or not at all.
pub struct Subscription {
    id: SubscriptionId,
    topic: String,
    channel: Arc<SubscriberChannel>,
    registry: Arc<TopicRegistry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription is closed.
    pub async fn next(&mut self) -> Option<Event> {
        self.channel.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        self.channel.try_recv()
    }

    /// Stop receiving events. Idempotent.
    ///
    /// Events still queued are discarded: after `close` returns, `next`
    /// yields `None`.
    pub fn close(&self) {
        if self.channel.close() {
            self.registry.unregister(&self.topic, self.id);
            tracing::debug!(
                subscription_id = %self.id,
                topic = %self.topic,
                lagged = self.channel.lagged(),
                "Subscription closed"
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Events dropped for this subscriber because its queue was full.
    pub fn lagged(&self) -> u64 {
        self.channel.lagged()
    }

    /// Events waiting to be read.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    /// Consume the subscription as a stream of events.
    ///
    /// Dropping the stream closes the subscription.
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            let event = subscription.next().await?;
            Some((event, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("closed", &self.channel.is_closed())
            .finish_non_exhaustive()
    }
}

/// Handle to the notification bus. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Bus {
    registry: Arc<TopicRegistry>,
    policy: QueuePolicy,
}

impl Bus {
    /// Create a bus whose subscriptions use `policy`.
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            registry: Arc::new(TopicRegistry::new()),
            policy,
        }
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Subscribe to a topic, creating it if unknown.
    ///
    /// After [`Self::close_all`] the returned subscription is already closed.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        self.open(topic, SubscriberChannel::new(self.policy))
    }

    /// Subscribe to a topic, yielding only events accepted by `predicate`.
    ///
    /// The predicate is evaluated per event at delivery, against `args`.
    pub fn subscribe_filtered(
        &self,
        topic: &str,
        args: Payload,
        predicate: impl Predicate,
    ) -> FilteredSubscription {
        let filter = EventFilter::new(args.clone(), predicate);
        let subscription = self.open(topic, SubscriberChannel::with_filter(self.policy, filter));
        FilteredSubscription::new(subscription, args)
    }

    fn open(&self, topic: &str, channel: SubscriberChannel) -> Subscription {
        let id = SubscriptionId::new();
        let channel = Arc::new(channel);

        match self.registry.register(topic, id, Arc::clone(&channel)) {
            Some(subscribers) => {
                tracing::debug!(subscription_id = %id, topic, subscribers, "Subscription opened");
            }
            None => {
                channel.close();
                tracing::debug!(subscription_id = %id, topic, "Bus closed, subscription ended");
            }
        }

        Subscription {
            id,
            topic: topic.to_string(),
            channel,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Publish a payload to everyone currently subscribed to `topic`.
    ///
    /// Fire-and-forget: the report is informational.
    pub fn publish(&self, topic: &str, payload: Payload) -> PublishReport {
        dispatch::dispatch(&self.registry, topic, payload)
    }

    /// Known topics with their subscriber counts, sorted by name.
    pub fn topics(&self) -> Vec<TopicInfo> {
        self.registry.topics()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry.subscriber_count(topic)
    }

    /// Close every subscription. Used at shutdown so open streams end.
    ///
    /// The bus stays closed: later subscriptions end immediately and are
    /// never registered. Returns the number of subscriptions closed.
    pub fn close_all(&self) -> usize {
        self.registry
            .drain()
            .iter()
            .filter(|channel| channel.close())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    fn payload(n: i64) -> Payload {
        let mut payload = Payload::new();
        payload.insert("n".to_string(), json!(n));
        payload
    }

    #[tokio::test]
    async fn test_subscribe_and_publish() {
        let bus = Bus::default();
        let mut subscription = bus.subscribe("t");

        let report = bus.publish("t", payload(1));
        assert_eq!(report.delivered, 1);

        let event = subscription.next().await.unwrap();
        assert_eq!(event.topic, "t");
        assert_eq!(event.payload, payload(1));
        assert!(event.published_at > 0);
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let bus = Bus::default();
        bus.publish("t", payload(1));

        let mut subscription = bus.subscribe("t");
        bus.publish("t", payload(2));

        assert_eq!(subscription.next().await.unwrap().payload, payload(2));
        assert!(subscription.try_next().is_none());
    }

    #[test]
    fn test_drop_unregisters() {
        let bus = Bus::default();
        let subscription = bus.subscribe("t");
        assert_eq!(bus.subscriber_count("t"), 1);

        drop(subscription);
        assert_eq!(bus.subscriber_count("t"), 0);
    }

    #[test]
    fn test_close_twice() {
        let bus = Bus::default();
        let subscription = bus.subscribe("t");

        subscription.close();
        subscription.close();
        assert!(subscription.is_closed());
        assert_eq!(bus.subscriber_count("t"), 0);
    }

    #[tokio::test]
    async fn test_close_all_ends_streams() {
        let bus = Bus::default();
        let a = bus.subscribe("a");
        let b = bus.subscribe("b");
        let already_closed = bus.subscribe("b");
        already_closed.close();

        let waiter = tokio::spawn(async move { a.into_stream().collect::<Vec<_>>().await });
        tokio::task::yield_now().await;

        assert_eq!(bus.close_all(), 2);
        assert!(waiter.await.unwrap().is_empty());
        assert!(b.is_closed());
        assert_eq!(bus.subscriber_count("b"), 0);
    }

    #[tokio::test]
    async fn test_subscribe_after_close_all_ends_immediately() {
        let bus = Bus::default();
        let early = bus.subscribe("t");
        assert_eq!(bus.close_all(), 1);
        assert!(early.is_closed());

        let mut late = bus.subscribe("t");
        let mut filtered =
            bus.subscribe_filtered("t", Payload::new(), |_: &Payload, _: &Payload| true);
        assert!(late.is_closed());
        assert!(filtered.is_closed());
        assert_eq!(bus.subscriber_count("t"), 0);

        let report = bus.publish("t", payload(1));
        assert_eq!(report.delivered, 0);
        assert!(late.next().await.is_none());
        assert!(filtered.next().await.is_none());
    }

    #[tokio::test]
    async fn test_close_discards_undelivered_events() {
        let bus = Bus::default();
        let mut subscription = bus.subscribe("t");
        bus.publish("t", payload(1));
        assert_eq!(subscription.pending(), 1);

        subscription.close();
        assert_eq!(subscription.pending(), 0);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_into_stream_yields_in_order() {
        let bus = Bus::default();
        let subscription = bus.subscribe("t");
        for n in 0..3 {
            bus.publish("t", payload(n));
        }

        let seen: Vec<i64> = subscription
            .into_stream()
            .take(3)
            .map(|event| event.payload["n"].as_i64().unwrap())
            .collect()
            .await;
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_lag_is_tracked_per_subscription() {
        let bus = Bus::new(QueuePolicy::bounded(1, Overflow::DropOldest));
        let slow = bus.subscribe("t");

        bus.publish("t", payload(1));
        bus.publish("t", payload(2));
        bus.publish("t", payload(3));

        assert_eq!(slow.lagged(), 2);
        assert_eq!(slow.pending(), 1);
    }

    #[test]
    fn test_subscription_ids_unique() {
        let bus = Bus::default();
        let a = bus.subscribe("t");
        let b = bus.subscribe("t");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string().len(), 36);
    }
}
