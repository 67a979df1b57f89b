//! Publish/subscribe hub for subscription sources.
//!
//! Subscribe resolvers typically grab an event stream from here and
//! hand it to the subscription pipeline; application code publishes
//! payloads by topic.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::events::{BoxEventStream, BroadcastEvents};

const DEFAULT_CAPACITY: usize = 256;

/// A topic-keyed broadcast hub.
#[derive(Clone)]
pub struct PubSub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<Value>>>>,
    capacity: usize,
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl PubSub {
    /// Creates a hub with the default per-topic capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Creates a hub with a custom per-topic capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publishes an event to a topic. Returns the number of
    /// subscribers that received it.
    pub async fn publish(&self, topic: impl AsRef<str>, event: Value) -> usize {
        let topic = topic.as_ref();
        let channels = self.channels.read().await;

        if let Some(sender) = channels.get(topic) {
            sender.send(event).unwrap_or(0)
        } else {
            0
        }
    }

    /// Subscribes to a topic, creating it on first use.
    pub async fn subscribe(&self, topic: impl Into<String>) -> BroadcastEvents {
        let topic = topic.into();
        let mut channels = self.channels.write().await;

        let receiver = if let Some(sender) = channels.get(&topic) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(self.capacity);
            channels.insert(topic, sender);
            receiver
        };
        BroadcastEvents::new(receiver)
    }

    /// Subscribes to a topic and boxes the stream for a subscribe
    /// resolver to return directly.
    pub async fn stream(&self, topic: impl Into<String>) -> BoxEventStream {
        Box::new(self.subscribe(topic).await)
    }

    /// Number of live topics.
    pub async fn topic_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Returns true if a topic currently has subscribers.
    pub async fn has_subscribers(&self, topic: &str) -> bool {
        let channels = self.channels.read().await;
        channels
            .get(topic)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    /// Drops topics with no remaining subscribers.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}
