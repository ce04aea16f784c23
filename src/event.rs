//! SSE event model and wire formatter
//!
//! An `SseEvent` is what travels over the backend: the event type plus its
//! JSON payload, serialized as `{"event": ..., "data": ...}`. The sequence
//! id and retry interval only exist on the wire to the HTTP client and are
//! supplied by the listener at delivery time.

use crate::error::{Result, SseError};
use serde::{Deserialize, Serialize};

/// A single event delivered to SSE clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Event type name, written to the `event:` field
    #[serde(rename = "event")]
    pub event_type: String,

    /// JSON payload, written to the `data:` field on a single line
    pub data: serde_json::Value,
}

impl SseEvent {
    /// Create a new event
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// Format the event as an SSE frame
    ///
    /// Fields are written in fixed order: an optional `retry:`, then `id:`,
    /// `event:` and `data:`, terminated by a blank line. The payload is
    /// compact JSON, so string values containing newlines are escaped and
    /// never split the `data:` line.
    pub fn format(&self, id: u64, retry: Option<u64>) -> String {
        let retry = retry
            .map(|ms| format!("retry: {}\n", ms))
            .unwrap_or_default();

        format!(
            "{}id: {}\nevent: {}\ndata: {}\n\n",
            retry, id, self.event_type, self.data
        )
    }

    /// Serialize the backend message for this event
    pub fn to_message(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a backend message
    pub fn from_message(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}

/// Reject event types that would break SSE line framing
pub fn validate_event_type(event_type: &str) -> Result<()> {
    if event_type.contains(['\r', '\n']) {
        return Err(SseError::InvalidEventType(event_type.to_string()));
    }
    Ok(())
}
