//! Streaming HTTP responses
//!
//! `SseResponse` pairs a `Listener` with the response headers. It converts
//! into an axum response whose body is the listener's frames, chunk per
//! event; transport concerns (chunking, keep-alive) stay with the server.
//! Optionally, an idle body emits `:` comment lines so proxies keep quiet
//! connections open; SSE clients ignore them.

use crate::listener::Listener;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream};
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

/// Content type of an SSE body
pub const TEXT_EVENT_STREAM: &str = "text/event-stream; charset=utf-8";

/// Comment frame sent on idle streams
pub const KEEP_ALIVE_COMMENT: &str = ":\n\n";

/// Idle interval used by the bundled server, as in axum's `KeepAlive::default()`
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Headers every SSE response starts from
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_EVENT_STREAM));
    headers
}

/// Overlay `overrides` on the defaults
///
/// A key present in `overrides` replaces every default value for that key;
/// other defaults are kept and new keys are added. No key is special-cased.
pub fn merge_headers(overrides: Option<&HeaderMap>) -> HeaderMap {
    let mut headers = default_headers();

    if let Some(overrides) = overrides {
        for key in overrides.keys() {
            headers.remove(key);
        }
        for (key, value) in overrides {
            headers.append(key.clone(), value.clone());
        }
    }

    headers
}

/// A streaming SSE response: merged headers plus the listener body
#[derive(Debug)]
pub struct SseResponse {
    headers: HeaderMap,
    listener: Listener,
    keep_alive: Option<Duration>,
}

impl SseResponse {
    /// Build a response for `listener`, overlaying `overrides` on the default headers
    pub fn new(listener: Listener, overrides: Option<&HeaderMap>) -> Self {
        Self {
            headers: merge_headers(overrides),
            listener,
            keep_alive: None,
        }
    }

    /// Emit a comment frame whenever no event was sent for `interval`
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = Some(interval);
        self
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Topic the body listens on
    pub fn topic(&self) -> &str {
        self.listener.topic()
    }

    /// The body as a stream of SSE frames
    pub fn into_listener(self) -> Listener {
        self.listener
    }

    /// Split into headers and body
    pub fn into_parts(self) -> (HeaderMap, Listener) {
        (self.headers, self.listener)
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let keep_alive = self.keep_alive;
        let (headers, listener) = self.into_parts();
        let body = match keep_alive {
            Some(interval) => {
                Body::from_stream(keep_alive_frames(listener, interval).map(Ok::<_, Infallible>))
            }
            None => Body::from_stream(listener.map(Ok::<_, Infallible>)),
        };
        (headers, body).into_response()
    }
}

/// Interleave `KEEP_ALIVE_COMMENT` into idle stretches of `listener`
///
/// The idle timer restarts after every frame. Ends when the listener ends.
pub(crate) fn keep_alive_frames(
    listener: Listener,
    interval: Duration,
) -> impl Stream<Item = String> + Send + 'static {
    stream::unfold(listener, move |mut listener| async move {
        match tokio::time::timeout(interval, listener.next()).await {
            Ok(Some(frame)) => Some((frame, listener)),
            Ok(None) => None,
            Err(_) => Some((KEEP_ALIVE_COMMENT.to_string(), listener)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SseEvent;
    use crate::provider::memory::MemoryProvider;
    use crate::stream::FilteredSseStream;
    use axum::http::HeaderName;
    use std::sync::Arc;

    #[test]
    fn test_default_headers_exact() {
        let headers = default_headers();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream; charset=utf-8");
    }

    #[test]
    fn test_merge_without_overrides() {
        assert_eq!(merge_headers(None), default_headers());
        assert_eq!(merge_headers(Some(&HeaderMap::new())), default_headers());
    }

    #[test]
    fn test_merge_overrides_and_adds() {
        let mut overrides = HeaderMap::new();
        overrides.insert("x-custom", HeaderValue::from_static("yes"));
        overrides.insert(
            HeaderName::from_bytes(b"Cache-Control").unwrap(),
            HeaderValue::from_static("no-store"),
        );

        let headers = merge_headers(Some(&overrides));
        assert_eq!(headers.len(), 4);
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[CACHE_CONTROL], "no-store");
        assert_eq!(headers[CONTENT_TYPE], TEXT_EVENT_STREAM);
        assert_eq!(headers["x-custom"], "yes");
    }

    #[test]
    fn test_merge_content_type_not_special_cased() {
        let mut overrides = HeaderMap::new();
        overrides.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let headers = merge_headers(Some(&overrides));
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_merge_multi_valued_override_replaces_default() {
        let mut overrides = HeaderMap::new();
        let key = HeaderName::from_static("cache-control");
        overrides.append(key.clone(), HeaderValue::from_static("no-store"));
        overrides.append(key.clone(), HeaderValue::from_static("private"));

        let headers = merge_headers(Some(&overrides));
        let values: Vec<_> = headers.get_all(&key).iter().collect();
        assert_eq!(values, vec!["no-store", "private"]);
    }

    #[tokio::test]
    async fn test_keep_alive_fills_idle_gaps() {
        let stream = FilteredSseStream::new("channel1", Arc::new(MemoryProvider::default()));
        let listener = stream.send("a").await.unwrap();
        let mut frames = Box::pin(keep_alive_frames(listener, Duration::from_millis(20)));

        assert_eq!(frames.next().await.unwrap(), KEEP_ALIVE_COMMENT);

        stream
            .publish(&SseEvent::new("event1", serde_json::json!({"a": 1})), "a")
            .await
            .unwrap();
        let mut next = frames.next().await.unwrap();
        while next == KEEP_ALIVE_COMMENT {
            next = frames.next().await.unwrap();
        }
        assert_eq!(next, "id: 1\nevent: event1\ndata: {\"a\":1}\n\n");

        stream.unsubscribe("a").await.unwrap();
        while let Some(frame) = frames.next().await {
            assert_eq!(frame, KEEP_ALIVE_COMMENT);
        }
    }

    #[tokio::test]
    async fn test_keep_alive_body_ends_with_listener() {
        let stream = FilteredSseStream::new("channel1", Arc::new(MemoryProvider::default()));
        let response = stream
            .stream("a", None)
            .await
            .unwrap()
            .with_keep_alive(Duration::from_millis(10))
            .into_response();

        let closer = stream.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            closer.unsubscribe("a").await.unwrap();
        });

        let body = tokio::time::timeout(
            Duration::from_secs(2),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("body did not finish")
        .unwrap();
        assert!(!body.is_empty());
        assert!(body
            .split(|b| *b == b'\n')
            .all(|line| line.is_empty() || line == b":"));
    }
}
