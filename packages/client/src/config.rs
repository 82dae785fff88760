//! Client configuration.

use std::time::Duration;

use etcdv2_http::TransportConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4001/";

/// Settings for an [`EtcdClient`](crate::EtcdClient).
///
/// ```ignore
/// let config = ClientConfig::new("http://10.0.0.5:2379")
///     .with_request_timeout(Some(Duration::from_secs(5)));
/// let client = EtcdClient::from_config(&config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the etcd server.
    pub endpoint: String,

    /// Bound on every call except `watch`, which waits as long as the server
    /// holds the connection.
    pub request_timeout: Option<Duration>,

    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport.connect_timeout = timeout;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.transport.worker_threads = Some(threads);
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.transport, TransportConfig::default());
    }

    #[test]
    fn builders() {
        let config = ClientConfig::new("http://h:2379")
            .with_request_timeout(None)
            .with_connect_timeout(Duration::from_secs(1))
            .with_worker_threads(2);

        assert_eq!(config.endpoint, "http://h:2379");
        assert!(config.request_timeout.is_none());
        assert_eq!(config.transport.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.transport.worker_threads, Some(2));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"endpoint":"http://h:4001/"}"#).unwrap();

        assert_eq!(config.endpoint, "http://h:4001/");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.transport.pool_max_idle_per_host, 32);
    }
}
