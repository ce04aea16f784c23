use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use crate::stream::FilteredSseStream;

/// Shared application state accessible to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub stream: FilteredSseStream,
    pub headers: Arc<HeaderMap>,
    pub retry_ms: Option<u64>,
    pub keep_alive: Option<Duration>,
}

impl AppState {
    pub fn new(stream: FilteredSseStream, headers: HeaderMap, retry_ms: Option<u64>) -> Self {
        Self {
            stream,
            headers: Arc::new(headers),
            retry_ms,
            keep_alive: None,
        }
    }

    /// Send keep-alive comments on idle event streams
    pub fn with_keep_alive(mut self, keep_alive: Option<Duration>) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
