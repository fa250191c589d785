//! Typed refresh-event bus.
//!
//! Dashboard views cache what they last fetched; after any mutation the
//! owning service publishes the topics whose data changed and subscribed
//! views re-fetch. Topics are payload-free signals.

use tokio::sync::broadcast;

/// Entities a dashboard view can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Accounts,
    Cards,
    Transactions,
    LineItems,
}

impl Topic {
    /// Wire name used on the SSE stream
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Accounts => "accounts-changed",
            Topic::Cards => "cards-changed",
            Topic::Transactions => "transactions-changed",
            Topic::LineItems => "future-transactions-changed",
        }
    }
}

/// All four topics, in broadcast order. Payment and reversal touch every
/// entity at once, so they publish the full set.
pub const ALL_TOPICS: [Topic; 4] = [
    Topic::Cards,
    Topic::Accounts,
    Topic::Transactions,
    Topic::LineItems,
];

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Topic>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Publish a single topic. Publishing with no subscribers is a no-op.
    pub fn publish(&self, topic: Topic) {
        let _ = self.sender.send(topic);
    }

    /// Publish every topic once, used after payment/reversal
    pub fn publish_all(&self) {
        for topic in ALL_TOPICS {
            self.publish(topic);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Topic> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
