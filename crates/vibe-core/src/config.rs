use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Client configuration, read from `config.toml`.
///
/// Every field has a default, so a partial or empty file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub default_stale_after_ms: u64,
    pub metrics_refetch_interval_ms: u64,
    pub notification_timeout_ms: u64,
    pub log_level: String,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn default_stale_after(&self) -> Duration {
        Duration::from_millis(self.default_stale_after_ms)
    }

    pub fn metrics_refetch_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_refetch_interval_ms)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: 30_000,
            default_stale_after_ms: 5_000,
            metrics_refetch_interval_ms: 30_000,
            notification_timeout_ms: 4_000,
            log_level: "info".to_string(),
        }
    }
}
