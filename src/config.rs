//! Server configuration
//!
//! Loaded once at startup from a TOML file and passed by reference to the
//! pieces that need it; nothing reads configuration from global state.

use crate::error::{Result, SseError};
use crate::provider::memory::{MemoryConfig, MemoryProvider};
use crate::provider::nats::{NatsConfig, NatsProvider};
use crate::provider::redis::{RedisConfig, RedisProvider};
use crate::provider::PubSubProvider;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Settings for the SSE server and CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseConfig {
    /// Host address for the HTTP server (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server (default: 8090)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base channel served under `/events`
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Reconnect delay advertised to clients via `retry:`, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_ms: Option<u64>,

    /// Idle seconds before an event stream sends a keep-alive comment; 0 disables
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Extra or replacement response headers for event streams
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Pub/sub backend
    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_channel() -> String {
    "events".to_string()
}

fn default_keep_alive_secs() -> u64 {
    crate::response::DEFAULT_KEEP_ALIVE.as_secs()
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            channel: default_channel(),
            retry_ms: None,
            keep_alive_secs: default_keep_alive_secs(),
            headers: BTreeMap::new(),
            provider: ProviderConfig::default(),
        }
    }
}

impl SseConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SseError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            SseError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Returns the server bind address string (e.g., "127.0.0.1:8090").
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Keep-alive interval for event streams, `None` when disabled
    pub fn keep_alive(&self) -> Option<Duration> {
        (self.keep_alive_secs > 0).then(|| Duration::from_secs(self.keep_alive_secs))
    }

    /// Configured headers as an overlay for `FilteredSseStream::stream`
    pub fn header_overrides(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SseError::Config(format!("Invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                SseError::Config(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

/// Backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// In-process broadcast; publishers must live in the server process
    Memory(MemoryConfig),
    /// Core NATS
    Nats(NatsConfig),
    /// Redis pub/sub
    Redis(RedisConfig),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Memory(MemoryConfig::default())
    }
}

impl ProviderConfig {
    /// Connect the configured backend
    pub async fn connect(&self) -> Result<Arc<dyn PubSubProvider>> {
        let provider: Arc<dyn PubSubProvider> = match self {
            Self::Memory(config) => Arc::new(MemoryProvider::new(config.clone())),
            Self::Nats(config) => Arc::new(NatsProvider::connect(config.clone()).await?),
            Self::Redis(config) => Arc::new(RedisProvider::connect(config.clone()).await?),
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SseConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8090);
        assert_eq!(config.channel, "events");
        assert!(config.retry_ms.is_none());
        assert_eq!(config.keep_alive(), Some(Duration::from_secs(15)));
        assert!(matches!(config.provider, ProviderConfig::Memory(_)));
    }

    #[test]
    fn test_keep_alive_disabled_with_zero() {
        let config: SseConfig = toml::from_str("keep_alive_secs = 0").unwrap();
        assert_eq!(config.keep_alive(), None);
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(SseConfig::default().bind_address(), "127.0.0.1:8090");
    }

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
            host = "0.0.0.0"
            port = 9000
            channel = "workflows"
            retry_ms = 3000

            [headers]
            "Cache-Control" = "no-store"
            "X-Accel-Buffering" = "no"

            [provider]
            type = "nats"
            url = "nats://nats.internal:4222"
        "#;
        let config: SseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.channel, "workflows");
        assert_eq!(config.retry_ms, Some(3000));
        assert_eq!(config.headers.len(), 2);
        match config.provider {
            ProviderConfig::Nats(nats) => {
                assert_eq!(nats.url, "nats://nats.internal:4222");
                assert_eq!(nats.connect_timeout_secs, 5);
            }
            other => panic!("expected nats provider, got {:?}", other),
        }
    }

    #[test]
    fn test_redis_provider_deserialize() {
        let config: SseConfig = toml::from_str(
            r#"
            [provider]
            type = "redis"
            url = "redis://cache:6379/2"
            "#,
        )
        .unwrap();
        assert!(matches!(config.provider, ProviderConfig::Redis(ref r) if r.url == "redis://cache:6379/2"));
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = SseConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(serialized.contains("channel"));
        let parsed: SseConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.port, config.port);
    }

    #[test]
    fn test_header_overrides() {
        let mut config = SseConfig::default();
        config
            .headers
            .insert("Cache-Control".to_string(), "no-store".to_string());

        let headers = config.header_overrides().unwrap();
        assert_eq!(headers["cache-control"], "no-store");
    }

    #[test]
    fn test_header_overrides_invalid_name() {
        let mut config = SseConfig::default();
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());

        assert!(matches!(
            config.header_overrides(),
            Err(SseError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sse.toml");
        std::fs::write(&path, "port = 7777\nchannel = \"jobs\"\n").unwrap();

        let config = SseConfig::load(&path).unwrap();
        assert_eq!(config.port, 7777);
        assert_eq!(config.channel, "jobs");
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SseConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(SseError::Config(_))));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = SseConfig::load_or_default(None).unwrap();
        assert_eq!(config.port, 8090);
    }

    #[tokio::test]
    async fn test_connect_memory_provider() {
        let provider = ProviderConfig::default().connect().await.unwrap();
        assert_eq!(provider.name(), "memory");
    }
}
