//! In-memory pub/sub provider
//!
//! Single-process backend built on `tokio::sync::broadcast`, one channel per
//! topic. Useful for tests and for deployments where publishers and HTTP
//! listeners live in the same process.
//!
//! A topic's channel exists only while it has subscriptions: the last
//! subscription to go away removes it from the map.

use super::{PubSubProvider, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// In-memory provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Per-topic buffer; a subscriber falling further behind skips messages
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1024
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Clone)]
enum Frame {
    Message(Bytes),
    Unsubscribe,
}

type TopicMap = HashMap<String, broadcast::Sender<Frame>>;

/// Shared topic table
///
/// Never held across an await point, so a blocking lock is enough and lets
/// `Drop` prune topics synchronously.
#[derive(Clone, Default)]
struct Topics(Arc<RwLock<TopicMap>>);

impl Topics {
    fn read(&self) -> RwLockReadGuard<'_, TopicMap> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TopicMap> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the topic's channel if nobody is subscribed to it anymore
    fn prune(&self, topic: &str) {
        let mut topics = self.write();
        if topics.get(topic).is_some_and(|tx| tx.receiver_count() == 0) {
            topics.remove(topic);
            tracing::trace!(topic, "Topic released");
        }
    }
}

/// In-memory pub/sub provider
#[derive(Clone)]
pub struct MemoryProvider {
    topics: Topics,
    config: MemoryConfig,
}

impl MemoryProvider {
    /// Create a provider with the given configuration
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            topics: Topics::default(),
            config,
        }
    }

    /// Number of open subscriptions on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of topics with a live channel
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[async_trait]
impl PubSubProvider for MemoryProvider {
    async fn publish(&self, topic: &str, message: Bytes) -> Result<()> {
        let delivered = match self.topics.read().get(topic) {
            Some(tx) => tx.send(Frame::Message(message)).is_ok(),
            None => {
                tracing::trace!(topic, "No subscribers, message dropped");
                return Ok(());
            }
        };

        if !delivered {
            // Every receiver was dropped since the last publish
            self.topics.prune(topic);
            tracing::trace!(topic, "Topic closed, message dropped");
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        let rx = self
            .topics
            .write()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.config.capacity).0)
            .subscribe();

        Ok(Box::new(MemorySubscription {
            rx,
            release: TopicRelease {
                topic: topic.to_string(),
                topics: self.topics.clone(),
            },
        }))
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        let removed = self.topics.write().remove(topic);

        if let Some(tx) = removed {
            let _ = tx.send(Frame::Unsubscribe);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Subscription on a `MemoryProvider` topic
pub struct MemorySubscription {
    // Field order matters: the receiver must be gone before `release` runs
    rx: broadcast::Receiver<Frame>,
    release: TopicRelease,
}

/// Prunes the subscription's topic once its receiver has been dropped
struct TopicRelease {
    topic: String,
    topics: Topics,
}

impl Drop for TopicRelease {
    fn drop(&mut self) {
        self.topics.prune(&self.topic);
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.rx.recv().await {
                Ok(Frame::Message(message)) => return Ok(Some(message)),
                Ok(Frame::Unsubscribe) | Err(broadcast::error::RecvError::Closed) => {
                    return Ok(None)
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        topic = %self.release.topic,
                        skipped,
                        "Subscriber lagged, messages skipped"
                    );
                }
            }
        }
    }

    fn topic(&self) -> &str {
        &self.release.topic
    }
}
