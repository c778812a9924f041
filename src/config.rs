//! Configuration management for the uptime monitor

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the trigger server binds to
    pub bind_addr: String,

    /// Port of the trigger server
    pub port: u16,

    /// Path of the service registry file
    pub store_path: String,

    /// URL alert and recovery batches are posted to
    pub webhook_url: String,

    /// Probe attempts per service and check
    pub retry_count: u32,

    /// Base delay between retry attempts
    pub retry_backoff: Duration,

    /// Per-attempt probe timeout
    pub probe_timeout: Duration,

    /// Echo requests sent per ping attempt
    pub ping_probe_count: u32,

    /// Replies required for a ping attempt to count as alive
    pub ping_min_replies: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            store_path: "services.json".to_string(),
            webhook_url: "http://localhost:9090/notifications".to_string(),
            retry_count: 3,
            retry_backoff: Duration::from_millis(1000),
            probe_timeout: Duration::from_secs(10),
            ping_probe_count: 3,
            ping_min_replies: 1,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(bind_addr) = env::var("BIND_ADDR") {
            config.bind_addr = bind_addr;
        }

        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        if let Ok(store_path) = env::var("STORE_PATH") {
            config.store_path = store_path;
        }

        if let Ok(webhook_url) = env::var("ALERT_WEBHOOK_URL") {
            config.webhook_url = webhook_url;
        }

        if let Ok(retries) = env::var("RETRY_COUNT") {
            if let Ok(retries) = retries.parse() {
                config.retry_count = retries;
            }
        }

        if let Ok(backoff) = env::var("RETRY_BACKOFF_MS") {
            if let Ok(ms) = backoff.parse::<u64>() {
                config.retry_backoff = Duration::from_millis(ms);
            }
        }

        if let Ok(timeout) = env::var("TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                config.probe_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(count) = env::var("PING_PROBE_COUNT") {
            if let Ok(count) = count.parse() {
                config.ping_probe_count = count;
            }
        }

        if let Ok(replies) = env::var("PING_MIN_REPLIES") {
            if let Ok(replies) = replies.parse() {
                config.ping_min_replies = replies;
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store_path.is_empty() {
            return Err("store_path cannot be empty".to_string());
        }

        if self.webhook_url.is_empty() {
            return Err("webhook_url cannot be empty".to_string());
        }

        if self.retry_count == 0 {
            return Err("retry_count must be greater than 0".to_string());
        }

        if self.ping_probe_count == 0 {
            return Err("ping_probe_count must be greater than 0".to_string());
        }

        if self.ping_min_replies == 0 || self.ping_min_replies > self.ping_probe_count {
            return Err(
                "ping_min_replies must be between 1 and ping_probe_count".to_string()
            );
        }

        Ok(())
    }
}
