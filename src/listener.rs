//! Listener sessions
//!
//! A `Listener` is one consumer's live subscription to a topic. It yields
//! formatted SSE frames in backend order, numbering them from 1 with a
//! counter private to the session, and ends when the topic is unsubscribed.

use crate::event::SseEvent;
use crate::provider::Subscription;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use uuid::Uuid;

/// Stream of formatted SSE frames for one topic
///
/// Single use: once it ends (after an unsubscribe or a backend close) it
/// keeps returning `None`. Dropping it releases the backend subscription.
pub struct Listener {
    topic: String,
    session_id: Uuid,
    inner: BoxStream<'static, String>,
}

struct Session {
    subscription: Box<dyn Subscription>,
    session_id: Uuid,
    next_id: u64,
    retry: Option<u64>,
}

impl Listener {
    pub(crate) fn new(subscription: Box<dyn Subscription>, retry: Option<u64>) -> Self {
        let topic = subscription.topic().to_string();
        let session_id = Uuid::new_v4();

        tracing::debug!(topic = %topic, session = %session_id, "Listener session opened");

        let session = Session {
            subscription,
            session_id,
            next_id: 1,
            retry,
        };

        Self {
            topic,
            session_id,
            inner: stream::unfold(session, next_frame).fuse().boxed(),
        }
    }

    /// Topic this listener is subscribed to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Unique id of this session, as used in log fields
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

async fn next_frame(mut session: Session) -> Option<(String, Session)> {
    loop {
        let raw = match session.subscription.next().await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(
                    topic = %session.subscription.topic(),
                    session = %session.session_id,
                    delivered = session.next_id - 1,
                    "Listener session closed"
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    topic = %session.subscription.topic(),
                    session = %session.session_id,
                    error = %e,
                    "Backend receive failed, closing listener session"
                );
                return None;
            }
        };

        match SseEvent::from_message(&raw) {
            Ok(event) => {
                let frame = event.format(session.next_id, session.retry);
                session.next_id += 1;
                return Some((frame, session));
            }
            Err(e) => {
                tracing::warn!(
                    topic = %session.subscription.topic(),
                    session = %session.session_id,
                    error = %e,
                    "Skipping malformed message"
                );
            }
        }
    }
}

impl Stream for Listener {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("topic", &self.topic)
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SseError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::collections::VecDeque;

    /// Replays a fixed script of receive results
    struct Scripted {
        script: VecDeque<Result<Option<Bytes>>>,
    }

    impl Scripted {
        fn boxed(script: Vec<Result<Option<Bytes>>>) -> Box<dyn Subscription> {
            Box::new(Self {
                script: script.into(),
            })
        }
    }

    #[async_trait]
    impl Subscription for Scripted {
        async fn next(&mut self) -> Result<Option<Bytes>> {
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn topic(&self) -> &str {
            "scripted"
        }
    }

    fn message(event_type: &str, data: serde_json::Value) -> Result<Option<Bytes>> {
        Ok(Some(Bytes::from(
            SseEvent::new(event_type, data).to_message().unwrap(),
        )))
    }

    #[tokio::test]
    async fn test_numbers_events_from_one() {
        let listener = Listener::new(
            Scripted::boxed(vec![
                message("a", json!({"n": 1})),
                message("b", json!({"n": 2})),
            ]),
            None,
        );

        let frames: Vec<String> = listener.collect().await;
        assert_eq!(
            frames,
            vec![
                SseEvent::new("a", json!({"n": 1})).format(1, None),
                SseEvent::new("b", json!({"n": 2})).format(2, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_retry_applied_to_every_frame() {
        let listener = Listener::new(
            Scripted::boxed(vec![message("a", json!({})), message("a", json!({}))]),
            Some(100),
        );

        let frames: Vec<String> = listener.collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.starts_with("retry: 100\n")));
    }

    #[tokio::test]
    async fn test_malformed_message_skipped_without_consuming_id() {
        let listener = Listener::new(
            Scripted::boxed(vec![
                message("a", json!({"n": 1})),
                Ok(Some(Bytes::from_static(b"{broken"))),
                message("b", json!({"n": 2})),
            ]),
            None,
        );

        let frames: Vec<String> = listener.collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[1].starts_with("id: 2\nevent: b\n"));
    }

    #[tokio::test]
    async fn test_backend_error_ends_session() {
        let listener = Listener::new(
            Scripted::boxed(vec![
                message("a", json!({})),
                Err(SseError::Connection("reset".to_string())),
                message("never", json!({})),
            ]),
            None,
        );

        let frames: Vec<String> = listener.collect().await;
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_ended_listener_stays_ended() {
        let mut listener = Listener::new(Scripted::boxed(vec![]), None);
        assert!(listener.next().await.is_none());
        assert!(listener.next().await.is_none());
        assert_eq!(listener.topic(), "scripted");
    }
}
