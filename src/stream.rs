//! Filtered SSE stream built on a pluggable pub/sub provider
//!
//! `FilteredSseStream` owns one base channel name and shares a provider
//! with its caller. Publishers address sub-partitions of the channel;
//! listeners subscribe to exactly one sub-partition and never observe the
//! others.

use crate::channel::{self, Subchannel};
use crate::error::Result;
use crate::event::{self, SseEvent};
use crate::listener::Listener;
use crate::provider::PubSubProvider;
use crate::push::PushBinder;
use crate::response::SseResponse;
use axum::http::HeaderMap;
use bytes::Bytes;
use std::sync::Arc;

/// One logical broadcast channel
///
/// Cheap to clone; clones share the provider. The provider's connection
/// lifecycle belongs to whoever constructed it.
#[derive(Clone)]
pub struct FilteredSseStream {
    channel: Arc<str>,
    provider: Arc<dyn PubSubProvider>,
}

impl FilteredSseStream {
    /// Create a stream for `channel` on a shared provider
    pub fn new(channel: impl Into<String>, provider: Arc<dyn PubSubProvider>) -> Self {
        Self {
            channel: Arc::from(channel.into()),
            provider,
        }
    }

    /// Base channel name
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The shared provider
    pub fn provider(&self) -> &Arc<dyn PubSubProvider> {
        &self.provider
    }

    /// Backend topic for a sub-partition
    ///
    /// `"{channel}.{key}"` for a key, the bare channel for `Subchannel::base()`.
    pub fn create_channel_name(&self, subchannel: impl Into<Subchannel>) -> String {
        channel::create_channel_name(&self.channel, &subchannel.into())
    }

    /// Validated backend topic for a sub-partition
    fn topic(&self, subchannel: Subchannel) -> Result<String> {
        subchannel.validate()?;
        Ok(channel::create_channel_name(&self.channel, &subchannel))
    }

    /// Publish a pre-built event to a sub-partition
    ///
    /// Fails with `SseError::InvalidSubchannel` for keys that do not name
    /// exactly one topic, before anything reaches the backend.
    pub async fn publish(&self, event: &SseEvent, subchannel: impl Into<Subchannel>) -> Result<()> {
        event::validate_event_type(&event.event_type)?;

        let topic = self.topic(subchannel.into())?;
        let message = Bytes::from(event.to_message()?);
        self.provider.publish(&topic, message).await?;

        tracing::debug!(topic = %topic, event_type = %event.event_type, "Event published");
        Ok(())
    }

    /// Start binding a producer to `event_type`
    ///
    /// ```rust
    /// use a3s_sse::{FilteredSseStream, MemoryProvider, Push};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> a3s_sse::Result<()> {
    /// let stream = FilteredSseStream::new("jobs", Arc::new(MemoryProvider::default()));
    /// let progress = stream
    ///     .push("progress")
    ///     .bind(|(job, pct): (u64, u8)| Push::new(serde_json::json!({"pct": pct}), job));
    ///
    /// progress.call((42, 80)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn push(&self, event_type: impl Into<String>) -> PushBinder {
        PushBinder::new(self.clone(), event_type.into())
    }

    /// Open a listener session on a sub-partition
    pub async fn send(&self, subchannel: impl Into<Subchannel>) -> Result<Listener> {
        self.send_with_retry(subchannel, None).await
    }

    /// Open a listener session whose frames advertise a client retry interval
    ///
    /// The backend subscription is in place when this returns, so events
    /// published afterwards are all delivered.
    pub async fn send_with_retry(
        &self,
        subchannel: impl Into<Subchannel>,
        retry: Option<u64>,
    ) -> Result<Listener> {
        let topic = self.topic(subchannel.into())?;
        let subscription = self.provider.subscribe(&topic).await?;
        Ok(Listener::new(subscription, retry))
    }

    /// End every listener session on a sub-partition
    ///
    /// Sessions first drain everything published before the call. Safe to
    /// call with no active session and to repeat.
    pub async fn unsubscribe(&self, subchannel: impl Into<Subchannel>) -> Result<()> {
        let topic = self.topic(subchannel.into())?;
        self.provider.unsubscribe(&topic).await?;

        tracing::debug!(topic = %topic, "Unsubscribe requested");
        Ok(())
    }

    /// Build a streaming HTTP response for a sub-partition
    ///
    /// Headers start from `Connection: keep-alive`, `Cache-Control: no-cache`
    /// and `Content-Type: text/event-stream; charset=utf-8`, with `headers`
    /// overlaid key by key.
    pub async fn stream(
        &self,
        subchannel: impl Into<Subchannel>,
        headers: Option<&HeaderMap>,
    ) -> Result<SseResponse> {
        self.stream_with_retry(subchannel, headers, None).await
    }

    /// Build a streaming HTTP response whose frames carry `retry:`
    pub async fn stream_with_retry(
        &self,
        subchannel: impl Into<Subchannel>,
        headers: Option<&HeaderMap>,
        retry: Option<u64>,
    ) -> Result<SseResponse> {
        let listener = self.send_with_retry(subchannel, retry).await?;
        Ok(SseResponse::new(listener, headers))
    }
}

impl std::fmt::Debug for FilteredSseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredSseStream")
            .field("channel", &self.channel)
            .field("provider", &self.provider.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SseError;
    use crate::provider::memory::MemoryProvider;
    use serde_json::json;

    fn test_stream() -> FilteredSseStream {
        FilteredSseStream::new("channel1", Arc::new(MemoryProvider::default()))
    }

    #[test]
    fn test_init() {
        let stream = test_stream();
        assert_eq!(stream.channel(), "channel1");
        assert_eq!(stream.provider().name(), "memory");
    }

    #[test]
    fn test_create_channel_name() {
        let stream = test_stream();
        assert_eq!(stream.create_channel_name("a"), "channel1.a");
        assert_eq!(stream.create_channel_name(14), "channel1.14");
        assert_eq!(stream.create_channel_name(Subchannel::base()), "channel1");
    }

    #[tokio::test]
    async fn test_publish_rejects_multiline_event_type() {
        let stream = test_stream();
        let event = SseEvent::new("bad\ntype", json!({}));
        let err = stream.publish(&event, "a").await.unwrap_err();
        assert!(matches!(err, SseError::InvalidEventType(_)));
    }

    #[tokio::test]
    async fn test_wildcard_keys_never_reach_the_backend() {
        let provider = Arc::new(MemoryProvider::default());
        let stream = FilteredSseStream::new("channel1", provider.clone());

        for key in [">", "*", "a.>", "a b", ""] {
            assert!(matches!(
                stream.send(key).await,
                Err(SseError::InvalidSubchannel { .. })
            ));
            assert!(matches!(
                stream.publish(&SseEvent::new("e", json!({})), key).await,
                Err(SseError::InvalidSubchannel { .. })
            ));
            assert!(matches!(
                stream.unsubscribe(key).await,
                Err(SseError::InvalidSubchannel { .. })
            ));
        }
        assert_eq!(provider.topic_count(), 0);
    }

    #[tokio::test]
    async fn test_send_subscribes_eagerly() {
        let provider = Arc::new(MemoryProvider::default());
        let stream = FilteredSseStream::new("channel1", provider.clone());

        let listener = stream.send("a").await.unwrap();
        assert_eq!(listener.topic(), "channel1.a");
        assert_eq!(provider.subscriber_count("channel1.a"), 1);

        drop(listener);
        assert_eq!(provider.subscriber_count("channel1.a"), 0);
    }

    #[tokio::test]
    async fn test_stream_response_topic() {
        let stream = test_stream();
        let response = stream.stream(Subchannel::base(), None).await.unwrap();
        assert_eq!(response.topic(), "channel1");
        assert_eq!(response.headers().len(), 3);
    }

    #[test]
    fn test_debug_omits_provider_internals() {
        let debug = format!("{:?}", test_stream());
        assert!(debug.contains("channel1"));
        assert!(debug.contains("memory"));
    }
}
