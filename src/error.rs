//! Error types for a3s-sse

use thiserror::Error;

/// Errors that can occur while publishing or streaming events
#[derive(Debug, Error)]
pub enum SseError {
    /// Backend connection failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Publish failure
    #[error("Failed to publish to topic '{topic}': {reason}")]
    Publish {
        topic: String,
        reason: String,
    },

    /// Subscribe failure
    #[error("Failed to subscribe to topic '{topic}': {reason}")]
    Subscribe {
        topic: String,
        reason: String,
    },

    /// The unsubscribe control signal could not be delivered
    #[error("Failed to unsubscribe from topic '{topic}': {reason}")]
    Unsubscribe {
        topic: String,
        reason: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Event type that cannot be framed as a single SSE field
    #[error("Invalid event type {0:?}: must not contain line breaks")]
    InvalidEventType(String),

    /// Sub-partition key that would not name exactly one topic
    #[error("Invalid subchannel key {key:?}: {reason}")]
    InvalidSubchannel {
        key: String,
        reason: &'static str,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server failure
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for SSE operations
pub type Result<T> = std::result::Result<T, SseError>;
