//! Per-subscriber delivery queue.
//!
//! Each subscription owns exactly one [`SubscriberChannel`]: a FIFO of
//! events with a closed flag. Publishers push without ever suspending; the
//! single consumer suspends in [`SubscriberChannel::recv`] until an event
//! arrives or the channel is closed.
//!
//! A channel may carry an [`EventFilter`]. Events it rejects are discarded at
//! push time, so they never occupy a queue slot or count as lag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::filter::EventFilter;
use super::Event;

/// What a full bounded queue does with a new event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Overflow {
    /// Evict the oldest queued event to make room.
    #[default]
    DropOldest,
    /// Discard the incoming event.
    DropNewest,
    /// Ignore the capacity and grow without limit.
    Unbounded,
}

/// Queue bound and overflow rule applied to every new subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePolicy {
    /// Maximum queued events per subscriber (ignored when unbounded).
    pub capacity: usize,
    /// Behavior when the queue is full.
    pub overflow: Overflow,
}

impl QueuePolicy {
    /// Default per-subscriber capacity.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// A bounded policy. A capacity of zero is treated as one.
    pub fn bounded(capacity: usize, overflow: Overflow) -> Self {
        Self {
            capacity: capacity.max(1),
            overflow,
        }
    }

    /// A policy that never drops.
    pub fn unbounded() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            overflow: Overflow::Unbounded,
        }
    }
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self::bounded(Self::DEFAULT_CAPACITY, Overflow::DropOldest)
    }
}

/// Result of pushing one event into a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The event was queued.
    Enqueued,
    /// The event was queued after evicting the oldest one.
    DroppedOldest,
    /// The queue was full and the event was discarded.
    DroppedNewest,
    /// The channel's filter rejected the event.
    Filtered,
    /// The channel is closed; the event was discarded.
    Closed,
}

#[derive(Debug, Default)]
struct ChannelState {
    queue: VecDeque<Event>,
    closed: bool,
}

/// FIFO event queue with an explicit close.
#[derive(Debug)]
pub struct SubscriberChannel {
    state: Mutex<ChannelState>,
    notify: Notify,
    policy: QueuePolicy,
    filter: Option<EventFilter>,
    lagged: AtomicU64,
}

impl SubscriberChannel {
    /// Create an open, empty channel.
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            state: Mutex::new(ChannelState::default()),
            notify: Notify::new(),
            policy,
            filter: None,
            lagged: AtomicU64::new(0),
        }
    }

    /// Create a channel that only queues events accepted by `filter`.
    pub fn with_filter(policy: QueuePolicy, filter: EventFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::new(policy)
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        // The state is a plain queue and flag; it stays consistent even if a
        // holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an event if the channel is open and its filter accepts it.
    ///
    /// Never suspends. Overflow drops are counted in [`Self::lagged`];
    /// filtered events are not.
    pub fn push(&self, event: Event) -> PushOutcome {
        if let Some(filter) = &self.filter {
            if self.is_closed() {
                return PushOutcome::Closed;
            }
            // Evaluated outside the lock: a predicate may be slow or panic.
            if !filter.accepts(&event) {
                return PushOutcome::Filtered;
            }
        }

        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return PushOutcome::Closed;
            }

            let full = state.queue.len() >= self.policy.capacity;
            match self.policy.overflow {
                Overflow::DropOldest if full => {
                    state.queue.pop_front();
                    state.queue.push_back(event);
                    PushOutcome::DroppedOldest
                }
                Overflow::DropNewest if full => PushOutcome::DroppedNewest,
                _ => {
                    state.queue.push_back(event);
                    PushOutcome::Enqueued
                }
            }
        };

        match outcome {
            PushOutcome::Enqueued => self.notify.notify_one(),
            PushOutcome::DroppedOldest => {
                self.lagged.fetch_add(1, Ordering::Relaxed);
                self.notify.notify_one();
            }
            PushOutcome::DroppedNewest => {
                self.lagged.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::Filtered | PushOutcome::Closed => {}
        }

        outcome
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the channel is closed.
    pub async fn recv(&self) -> Option<Event> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking state so a close or push between the
            // check and the await still wakes us.
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(event) = state.queue.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&self) -> Option<Event> {
        self.lock().queue.pop_front()
    }

    /// Close the channel, discard anything still queued and wake the consumer.
    ///
    /// Returns `true` if this call closed it, `false` if it was already closed.
    pub fn close(&self) -> bool {
        let newly_closed = {
            let mut state = self.lock();
            state.queue.clear();
            !std::mem::replace(&mut state.closed, true)
        };
        if newly_closed {
            self.notify.notify_waiters();
        }
        newly_closed
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of events waiting to be consumed.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events dropped because of overflow since creation.
    pub fn lagged(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }
}
