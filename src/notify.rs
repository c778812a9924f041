//! Alert and recovery notification dispatch

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::errors::{MonitorError, Result};

/// Notification seam for alert and recovery batches.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Announce newly failed services. No-op for an empty batch.
    async fn send_alert(&self, names: &[String]) -> Result<()>;
    /// Announce recovered services. No-op for an empty batch.
    async fn send_recovery(&self, names: &[String]) -> Result<()>;
}

/// Payload posted to the notification webhook.
#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    kind: &'static str,
    services: &'a [String],
    sent_at: DateTime<Utc>,
}

/// Posts alert and recovery batches as JSON to a configured webhook.
///
/// Delivery is a single attempt; a missed notification self-corrects on a
/// later state transition.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("uptime_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, url })
    }

    async fn post(&self, kind: &'static str, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let payload = NotificationPayload {
            kind,
            services: names,
            sent_at: Utc::now(),
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(MonitorError::Notify(format!(
                "webhook answered {} for the {} batch",
                response.status(),
                kind
            )));
        }

        debug!("delivered {} notification for {} services", kind, names.len());
        Ok(())
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn send_alert(&self, names: &[String]) -> Result<()> {
        self.post("alert", names).await
    }

    async fn send_recovery(&self, names: &[String]) -> Result<()> {
        self.post("recovery", names).await
    }
}
