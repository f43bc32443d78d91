//! Per-subscriber predicate filtering.
//!
//! A [`FilteredSubscription`] narrows a broad topic to the events one
//! subscriber cares about, e.g. a single song id, without the publisher
//! knowing anyone's interest. The predicate runs when an event is delivered
//! to the subscriber's channel: non-matching events are discarded there and
//! never take a queue slot, so unrelated traffic cannot evict a matching
//! event under overflow.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::Stream;

use super::{Event, Payload, Subscription, SubscriptionId};

/// Decides whether an event payload is relevant to a subscriber.
///
/// `args` are the arguments the subscriber supplied when subscribing.
pub trait Predicate: Send + Sync + 'static {
    fn matches(&self, payload: &Payload, args: &Payload) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&Payload, &Payload) -> bool + Send + Sync + 'static,
{
    fn matches(&self, payload: &Payload, args: &Payload) -> bool {
        (self)(payload, args)
    }
}

/// Predicate matching when `payload[field] == args[field]`.
///
/// A field missing on either side never matches.
pub fn field_equals(field: &'static str) -> impl Predicate {
    move |payload: &Payload, args: &Payload| match (payload.get(field), args.get(field)) {
        (Some(value), Some(expected)) => value == expected,
        _ => false,
    }
}

/// A predicate bound to the arguments of one subscription.
#[derive(Clone)]
pub struct EventFilter {
    predicate: Arc<dyn Predicate>,
    args: Payload,
}

impl EventFilter {
    pub fn new(args: Payload, predicate: impl Predicate) -> Self {
        Self {
            predicate: Arc::new(predicate),
            args,
        }
    }

    pub fn args(&self) -> &Payload {
        &self.args
    }

    /// Whether `event` should be delivered.
    ///
    /// A panicking predicate counts as "no match" for that event only.
    pub fn accepts(&self, event: &Event) -> bool {
        let predicate = &self.predicate;
        let args = &self.args;
        match catch_unwind(AssertUnwindSafe(|| predicate.matches(&event.payload, args))) {
            Ok(matched) => matched,
            Err(_) => {
                tracing::warn!(
                    topic = %event.topic,
                    "Subscription predicate panicked, event skipped"
                );
                false
            }
        }
    }
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFilter")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A subscription that only yields events accepted by its predicate.
///
/// Built by [`super::Bus::subscribe_filtered`], which installs the filter
/// on the subscription's channel.
pub struct FilteredSubscription {
    inner: Subscription,
    args: Payload,
}

impl FilteredSubscription {
    pub(super) fn new(inner: Subscription, args: Payload) -> Self {
        Self { inner, args }
    }

    pub fn id(&self) -> SubscriptionId {
        self.inner.id()
    }

    pub fn topic(&self) -> &str {
        self.inner.topic()
    }

    /// Arguments supplied at subscribe time.
    pub fn args(&self) -> &Payload {
        &self.args
    }

    /// Wait for the next matching event.
    ///
    /// Returns `None` when the subscription is closed.
    pub async fn next(&mut self) -> Option<Event> {
        self.inner.next().await
    }

    pub fn try_next(&mut self) -> Option<Event> {
        self.inner.try_next()
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Matching events dropped because of overflow.
    pub fn lagged(&self) -> u64 {
        self.inner.lagged()
    }

    /// Consume the subscription as a stream of matching events.
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            let event = subscription.next().await?;
            Some((event, subscription))
        })
    }
}

impl fmt::Debug for FilteredSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredSubscription")
            .field("inner", &self.inner)
            .field("args", &self.args)
            .finish()
    }
}
