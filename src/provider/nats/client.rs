//! NATS client: connect, publish, subscribe

use super::config::NatsConfig;
use super::subscriber::NatsSubscription;
use crate::error::{SseError, Result};
use crate::provider::UNSUBSCRIBE_FRAME;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// NATS core pub/sub client
///
/// Thin wrapper over an `async_nats::Client`. All publishes and
/// subscriptions share the one connection, which keeps per-topic order
/// between events and the unsubscribe signal.
#[derive(Clone)]
pub struct NatsClient {
    client: async_nats::Client,
    config: Arc<NatsConfig>,
}

impl NatsClient {
    /// Connect to the NATS server
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = build_connect_options(&config)
            .connect(&config.url)
            .await
            .map_err(|e| SseError::Connection(format!("{}: {}", config.url, e)))?;

        tracing::info!(url = %config.url, "Connected to NATS");

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Publish a raw message
    pub async fn publish(&self, topic: &str, message: Bytes) -> Result<()> {
        self.client
            .publish(topic.to_string(), message)
            .await
            .map_err(|e| SseError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    /// Subscribe and wait until the server has registered the interest
    pub async fn subscribe(&self, topic: &str) -> Result<NatsSubscription> {
        if is_wildcard_subject(topic) {
            return Err(SseError::Subscribe {
                topic: topic.to_string(),
                reason: "wildcard subjects match more than one topic".to_string(),
            });
        }

        let subscriber = self
            .client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| SseError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        self.client.flush().await.map_err(|e| SseError::Subscribe {
            topic: topic.to_string(),
            reason: format!("flush failed: {}", e),
        })?;

        Ok(NatsSubscription::new(topic, subscriber))
    }

    /// Publish the unsubscribe control frame on a topic
    pub async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.client
            .publish(topic.to_string(), Bytes::from_static(UNSUBSCRIBE_FRAME))
            .await
            .map_err(|e| SseError::Unsubscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        self.client.flush().await.map_err(|e| SseError::Unsubscribe {
            topic: topic.to_string(),
            reason: format!("flush failed: {}", e),
        })
    }

    /// Whether the connection is currently established
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Get the underlying NATS client
    pub fn nats_client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Get the configuration
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }
}

/// Whether NATS would treat `subject` as a wildcard interest
fn is_wildcard_subject(subject: &str) -> bool {
    subject.split('.').any(|token| token == "*" || token == ">")
}

/// Build NATS connect options from config
fn build_connect_options(config: &NatsConfig) -> async_nats::ConnectOptions {
    let mut opts = async_nats::ConnectOptions::new()
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
        .request_timeout(Some(Duration::from_secs(config.request_timeout_secs)));

    if let Some(ref token) = config.token {
        opts = opts.token(token.clone());
    }

    opts
}
