//! NATS subscription handle

use crate::error::Result;
use crate::provider::{is_unsubscribe_frame, Subscription};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

/// Subscription on a NATS subject
pub struct NatsSubscription {
    topic: String,
    subscriber: async_nats::Subscriber,
}

impl NatsSubscription {
    pub(crate) fn new(topic: &str, subscriber: async_nats::Subscriber) -> Self {
        Self {
            topic: topic.to_string(),
            subscriber,
        }
    }
}

#[async_trait]
impl Subscription for NatsSubscription {
    async fn next(&mut self) -> Result<Option<Bytes>> {
        match self.subscriber.next().await {
            Some(msg) if is_unsubscribe_frame(&msg.payload) => {
                if let Err(e) = self.subscriber.unsubscribe().await {
                    tracing::debug!(topic = %self.topic, error = %e, "NATS unsubscribe failed");
                }
                Ok(None)
            }
            Some(msg) => Ok(Some(msg.payload)),
            None => Ok(None),
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
