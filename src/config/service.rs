//! HTTP API and connection supervisor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP API server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Interface to bind
    pub listen_host: String,
    /// Listen port
    pub port: u16,
    /// Artificial delay before each by-SKU lookup, in milliseconds
    pub sku_delay_ms: u64,
}

impl HttpConfig {
    /// `host:port` string for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.port)
    }

    pub fn sku_delay(&self) -> Duration {
        Duration::from_millis(self.sku_delay_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            port: 8080,
            sku_delay_ms: 0,
        }
    }
}

/// Connection supervisor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Fixed wait between failed connection attempts, in milliseconds
    pub retry_interval_ms: u64,
    /// Liveness ping interval once connected, in milliseconds (0 disables)
    pub ping_interval_ms: u64,
}

impl SupervisorConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Probe interval, or `None` when the connection is latched after first success
    pub fn ping_interval(&self) -> Option<Duration> {
        (self.ping_interval_ms > 0).then(|| Duration::from_millis(self.ping_interval_ms))
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 2000,
            ping_interval_ms: 0,
        }
    }
}
