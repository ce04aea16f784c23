//! Redis pub/sub provider
//!
//! Publishes through a shared `ConnectionManager` and opens one dedicated
//! pub/sub connection per subscription, as Redis requires.

use crate::error::{Result, SseError};
use crate::provider::{is_unsubscribe_frame, PubSubProvider, Subscription, UNSUBSCRIBE_FRAME};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Redis connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL (e.g., "redis://127.0.0.1:6379/0")
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

/// Redis pub/sub provider
pub struct RedisProvider {
    client: redis::Client,
    conn: redis::aio::ConnectionManager,
}

impl RedisProvider {
    /// Connect to Redis
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| SseError::Connection(format!("{}: {}", config.url, e)))?;

        let conn = redis::aio::ConnectionManager::new(client.clone())
            .await
            .map_err(|e| SseError::Connection(format!("{}: {}", config.url, e)))?;

        tracing::info!(url = %config.url, "Connected to Redis");

        Ok(Self { client, conn })
    }

    async fn publish_raw(&self, topic: &str, message: &[u8]) -> redis::RedisResult<i64> {
        let mut conn = self.conn.clone();
        conn.publish(topic, message).await
    }
}

#[async_trait]
impl PubSubProvider for RedisProvider {
    async fn publish(&self, topic: &str, message: Bytes) -> Result<()> {
        let receivers = self
            .publish_raw(topic, &message)
            .await
            .map_err(|e| SseError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        tracing::trace!(topic, receivers, "Published to Redis");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        let subscribe_err = |e: redis::RedisError| SseError::Subscribe {
            topic: topic.to_string(),
            reason: e.to_string(),
        };

        let mut pubsub = self.client.get_async_pubsub().await.map_err(subscribe_err)?;
        pubsub.subscribe(topic).await.map_err(subscribe_err)?;

        Ok(Box::new(RedisSubscription {
            topic: topic.to_string(),
            messages: pubsub.into_on_message().boxed(),
        }))
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.publish_raw(topic, UNSUBSCRIBE_FRAME)
            .await
            .map_err(|e| SseError::Unsubscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }

    async fn health(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        Ok(pong.is_ok())
    }
}

/// Subscription on a Redis channel
///
/// Owns its pub/sub connection; dropping it closes the connection.
pub struct RedisSubscription {
    topic: String,
    messages: BoxStream<'static, redis::Msg>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next(&mut self) -> Result<Option<Bytes>> {
        match self.messages.next().await {
            Some(msg) if is_unsubscribe_frame(msg.get_payload_bytes()) => Ok(None),
            Some(msg) => Ok(Some(Bytes::copy_from_slice(msg.get_payload_bytes()))),
            None => Ok(None),
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
