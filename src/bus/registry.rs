//! Topic registry mapping topic names to live subscriber channels.
//!
//! Topics are created lazily on first subscribe or publish and are never
//! removed, only emptied. The lock is held while copying or mutating a
//! subscriber set, never while delivering.
//!
//! [`TopicRegistry::drain`] also shuts the registry: from then on
//! registration is refused.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::channel::SubscriberChannel;
use super::SubscriptionId;
use crate::observability::metrics::record_subscribers;

type Subscribers = HashMap<SubscriptionId, Arc<SubscriberChannel>>;

/// A known topic and its live subscriber count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicInfo {
    pub name: String,
    pub subscribers: usize,
}

/// Registry of topics and their subscribers.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: RwLock<HashMap<String, Subscribers>>,
    // Only written with the `topics` write lock held.
    shut_down: AtomicBool,
}

impl TopicRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Subscribers>> {
        self.topics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Subscribers>> {
        self.topics.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a subscriber to a topic, creating the topic if needed.
    ///
    /// Returns the topic's subscriber count after registration, or `None`
    /// if the registry has been drained.
    pub fn register(
        &self,
        topic: &str,
        id: SubscriptionId,
        channel: Arc<SubscriberChannel>,
    ) -> Option<usize> {
        let count = {
            let mut topics = self.write();
            if self.shut_down.load(Ordering::Acquire) {
                return None;
            }
            let subscribers = topics.entry(topic.to_string()).or_default();
            subscribers.insert(id, channel);
            subscribers.len()
        };
        record_subscribers(topic, count);
        Some(count)
    }

    /// Remove a subscriber from a topic.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister(&self, topic: &str, id: SubscriptionId) -> bool {
        let removed = {
            let mut topics = self.write();
            topics
                .get_mut(topic)
                .and_then(|subscribers| subscribers.remove(&id).map(|_| subscribers.len()))
        };

        match removed {
            Some(count) => {
                record_subscribers(topic, count);
                true
            }
            None => false,
        }
    }

    /// Copy the current subscriber set of a topic.
    ///
    /// An unknown topic is created empty and yields no subscribers.
    pub fn snapshot(&self, topic: &str) -> Vec<Arc<SubscriberChannel>> {
        if let Some(subscribers) = self.read().get(topic) {
            return subscribers.values().cloned().collect();
        }

        self.write().entry(topic.to_string()).or_default();
        Vec::new()
    }

    /// Live subscriber count for a topic (0 if unknown).
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.read().get(topic).map_or(0, HashMap::len)
    }

    /// All known topics, sorted by name.
    pub fn topics(&self) -> Vec<TopicInfo> {
        let mut topics: Vec<TopicInfo> = self
            .read()
            .iter()
            .map(|(name, subscribers)| TopicInfo {
                name: name.clone(),
                subscribers: subscribers.len(),
            })
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        topics
    }

    /// Remove every subscriber from every topic, keeping the topics, and
    /// refuse further registrations.
    ///
    /// Returns the removed channels so the caller can close them.
    pub fn drain(&self) -> Vec<Arc<SubscriberChannel>> {
        let mut drained = Vec::new();
        let mut emptied = Vec::new();
        {
            let mut topics = self.write();
            self.shut_down.store(true, Ordering::Release);
            for (name, subscribers) in topics.iter_mut() {
                if !subscribers.is_empty() {
                    emptied.push(name.clone());
                }
                drained.extend(subscribers.drain().map(|(_, channel)| channel));
            }
        }
        for name in &emptied {
            record_subscribers(name, 0);
        }
        drained
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}
