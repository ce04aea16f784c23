//! Producers bound to an event type
//!
//! `FilteredSseStream::push(event_type)` returns a `PushBinder`; binding a
//! producer function to it yields a `Pusher`. Each `Pusher::call` runs the
//! producer and publishes exactly one event to the sub-partition it picked.

use crate::channel::Subchannel;
use crate::error::Result;
use crate::event::SseEvent;
use crate::stream::FilteredSseStream;

/// What a producer returns: the payload, where to send it, and optionally
/// an event type replacing the bound one
#[derive(Debug, Clone, PartialEq)]
pub struct Push {
    data: serde_json::Value,
    subchannel: Subchannel,
    event_type: Option<String>,
}

impl Push {
    /// Send `data` to a sub-partition under the bound event type
    pub fn new(data: serde_json::Value, subchannel: impl Into<Subchannel>) -> Self {
        Self {
            data,
            subchannel: subchannel.into(),
            event_type: None,
        }
    }

    /// Send `data` to the base channel under the bound event type
    pub fn to_base(data: serde_json::Value) -> Self {
        Self::new(data, Subchannel::base())
    }

    /// Override the bound event type for this push
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }
}

/// Event type waiting for a producer
#[derive(Clone)]
pub struct PushBinder {
    stream: FilteredSseStream,
    event_type: String,
}

impl PushBinder {
    pub(crate) fn new(stream: FilteredSseStream, event_type: String) -> Self {
        Self { stream, event_type }
    }

    /// Bind a producer, yielding the callable publisher
    pub fn bind<F>(self, producer: F) -> Pusher<F> {
        Pusher {
            stream: self.stream,
            event_type: self.event_type,
            producer,
        }
    }
}

/// A producer bound to an event type and a stream
///
/// Holds no state between calls besides the shared backend, so one
/// `Pusher` (behind an `Arc` if needed) can be called concurrently.
#[derive(Clone)]
pub struct Pusher<F> {
    stream: FilteredSseStream,
    event_type: String,
    producer: F,
}

impl<F> Pusher<F> {
    /// Run the producer with `args` and publish its event
    ///
    /// Returns the published event. A failed publish surfaces as
    /// `SseError::Publish` and leaves the pusher usable.
    pub async fn call<A>(&self, args: A) -> Result<SseEvent>
    where
        F: Fn(A) -> Push,
    {
        let push = (self.producer)(args);
        let event_type = push.event_type.unwrap_or_else(|| self.event_type.clone());
        let event = SseEvent::new(event_type, push.data);

        self.stream.publish(&event, push.subchannel).await?;
        Ok(event)
    }

    /// Event type used when the producer does not override it
    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}
