//! Pub/sub provider trait for streaming backends
//!
//! All backends (in-memory, NATS, Redis) implement `PubSubProvider` so that
//! a `FilteredSseStream` can fan events out without knowing the transport.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub mod memory;
pub mod nats;
pub mod redis;

/// Core trait for pub/sub backends
///
/// Topics are exact-match: a subscription on `channel.a` never receives
/// messages published to `channel` or `channel.b`. Messages on a single
/// topic are delivered in publish order.
#[async_trait]
pub trait PubSubProvider: Send + Sync {
    /// Publish a raw message to a topic
    ///
    /// Fire-and-forget: returns once the backend accepted the message,
    /// whether or not anyone is subscribed.
    async fn publish(&self, topic: &str, message: Bytes) -> Result<()>;

    /// Subscribe to a topic
    ///
    /// The subscription is registered with the backend before this returns,
    /// so anything published afterwards is observed.
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>>;

    /// End every open subscription on a topic
    ///
    /// The signal is ordered after all messages already published to the
    /// topic. Calling this without subscribers, or repeatedly, is a no-op.
    async fn unsubscribe(&self, topic: &str) -> Result<()>;

    /// Provider name (e.g., "memory", "nats", "redis")
    fn name(&self) -> &str;

    /// Health check; returns true if the provider is connected and operational
    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Async subscription handle for receiving raw messages
///
/// Dropping the handle releases the backend subscription.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next message
    ///
    /// Returns `Ok(None)` once the topic was unsubscribed or the backend
    /// closed the subscription; no further messages follow.
    async fn next(&mut self) -> Result<Option<Bytes>>;

    /// Topic this subscription listens on
    fn topic(&self) -> &str;
}

/// Reserved message that ends subscriptions on backends without an
/// out-of-band close (NATS, Redis). Event messages are JSON objects and
/// can never start with a NUL byte.
pub(crate) const UNSUBSCRIBE_FRAME: &[u8] = b"\0a3s-sse/unsubscribe";

pub(crate) fn is_unsubscribe_frame(payload: &[u8]) -> bool {
    payload == UNSUBSCRIBE_FRAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_frame_detection() {
        assert!(is_unsubscribe_frame(UNSUBSCRIBE_FRAME));
        assert!(!is_unsubscribe_frame(br#"{"event":"e","data":{}}"#));
        assert!(!is_unsubscribe_frame(b""));
    }
}
