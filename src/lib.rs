//! # a3s-sse
//!
//! Filtered, channel-based Server-Sent Events over pluggable pub/sub backends.
//!
//! ## Overview
//!
//! A `FilteredSseStream` owns one base channel. Services publish typed
//! events to sub-partitions of it (`"{channel}.{key}"`); every HTTP client
//! subscribes to exactly its sub-partition and receives a correctly framed
//! SSE stream, numbered per client from 1.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_sse::{FilteredSseStream, MemoryProvider, Push};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn example() -> a3s_sse::Result<()> {
//! let stream = FilteredSseStream::new("workflows", Arc::new(MemoryProvider::default()));
//!
//! // Listen on one sub-partition
//! let mut listener = stream.send("wf-1").await?;
//!
//! // Publish through a bound producer
//! let started = stream
//!     .push("workflow.started")
//!     .bind(|id: &str| Push::new(serde_json::json!({"id": id}), id));
//! started.call("wf-1").await?;
//!
//! assert_eq!(
//!     listener.next().await.unwrap(),
//!     "id: 1\nevent: workflow.started\ndata: {\"id\":\"wf-1\"}\n\n"
//! );
//!
//! // End the session
//! stream.unsubscribe("wf-1").await?;
//! assert!(listener.next().await.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Providers
//!
//! - **memory** — In-process broadcast for tests and single-node use
//! - **nats** — Core NATS subjects for multi-process fan-out
//! - **redis** — Redis PUBLISH/SUBSCRIBE
//!
//! ## Architecture
//!
//! - **PubSubProvider** trait — publish/subscribe/unsubscribe on raw topics
//! - **FilteredSseStream** — channel naming, publishing and listener sessions
//! - **Listener** — per-session stream of formatted SSE frames
//! - **SseResponse** — headers plus listener body, an axum `IntoResponse`

pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod provider;
pub mod push;
pub mod response;
pub mod server;
pub mod stream;

// Re-export core types
pub use channel::{create_channel_name, Subchannel};
pub use config::{ProviderConfig, SseConfig};
pub use error::{Result, SseError};
pub use event::SseEvent;
pub use listener::Listener;
pub use provider::{PubSubProvider, Subscription};
pub use push::{Push, PushBinder, Pusher};
pub use response::{
    default_headers, merge_headers, SseResponse, DEFAULT_KEEP_ALIVE, KEEP_ALIVE_COMMENT,
    TEXT_EVENT_STREAM,
};
pub use stream::FilteredSseStream;

// Re-export providers for convenience
pub use provider::memory::{MemoryConfig, MemoryProvider};
pub use provider::nats::{NatsClient, NatsConfig, NatsProvider, NatsSubscription};
pub use provider::redis::{RedisConfig, RedisProvider};
