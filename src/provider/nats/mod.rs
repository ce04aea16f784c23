//! NATS event provider
//!
//! Implements `PubSubProvider` using core NATS subjects. Delivery is
//! at-most-once with no persistence: a listener only sees what is published
//! while it is subscribed.

mod client;
mod config;
mod subscriber;

pub use client::NatsClient;
pub use config::NatsConfig;
pub use subscriber::NatsSubscription;

use crate::error::Result;
use crate::provider::{PubSubProvider, Subscription};
use async_trait::async_trait;
use bytes::Bytes;

/// NATS pub/sub provider
///
/// Wraps `NatsClient` and implements the `PubSubProvider` trait.
pub struct NatsProvider {
    client: NatsClient,
}

impl NatsProvider {
    /// Connect to NATS
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = NatsClient::connect(config).await?;
        Ok(Self { client })
    }

    /// Get the underlying NATS client for advanced usage
    pub fn client(&self) -> &NatsClient {
        &self.client
    }
}

#[async_trait]
impl PubSubProvider for NatsProvider {
    async fn publish(&self, topic: &str, message: Bytes) -> Result<()> {
        self.client.publish(topic, message).await
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>> {
        let sub = self.client.subscribe(topic).await?;
        Ok(Box::new(sub))
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.client.unsubscribe(topic).await
    }

    fn name(&self) -> &str {
        "nats"
    }

    async fn health(&self) -> Result<bool> {
        Ok(self.client.is_connected())
    }
}
