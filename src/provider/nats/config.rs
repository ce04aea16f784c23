//! NATS provider configuration

use serde::{Deserialize, Serialize};

/// NATS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server URL (e.g., "nats://127.0.0.1:4222")
    #[serde(default = "default_url")]
    pub url: String,

    /// Optional auth token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.url, "nats://127.0.0.1:4222");
        assert!(config.token.is_none());
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: NatsConfig =
            serde_json::from_str(r#"{"url": "nats://nats.internal:4222"}"#).unwrap();
        assert_eq!(config.url, "nats://nats.internal:4222");
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[test]
    fn test_token_skipped_when_none() {
        let json = serde_json::to_string(&NatsConfig::default()).unwrap();
        assert!(!json.contains("token"));
    }
}
