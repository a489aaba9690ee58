//! Client configuration

use std::time::Duration;

use crate::push::ReconnectPolicy;

/// Client configuration for connecting to the order server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:5000")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Push channel reconnect behaviour
    pub reconnect_policy: ReconnectPolicy,

    /// Push handshake timeout, none by default
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: 30,
            reconnect_policy: ReconnectPolicy::default(),
            connect_timeout: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Push endpoint: `http` becomes `ws`, `https` becomes `wss`, plus `/ws`
    pub fn ws_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{base}/ws")
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_follows_scheme() {
        assert_eq!(ClientConfig::new("http://shop:5000/").ws_url(), "ws://shop:5000/ws");
        assert_eq!(ClientConfig::new("https://shop.example").ws_url(), "wss://shop.example/ws");
    }

    #[test]
    fn builder_sets_fields() {
        let config = ClientConfig::new("http://localhost:5000")
            .with_timeout(5)
            .with_connect_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, 5);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.reconnect_policy, ReconnectPolicy::default());
        assert_eq!(config.url("/api/orders"), "http://localhost:5000/api/orders");
    }

    #[test]
    fn reconnect_policy_is_replaceable() {
        let policy = ReconnectPolicy::Backoff {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            max_attempts: Some(5),
        };
        let config = ClientConfig::new("http://localhost:5000").with_reconnect_policy(policy.clone());
        assert_eq!(config.reconnect_policy, policy);
    }
}
