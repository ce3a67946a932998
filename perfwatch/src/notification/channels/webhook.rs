//! Generic webhook delivery plugin.
//!
//! The subscriber's configuration is the target URL; every notification is a
//! JSON document POSTed to it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::{DeliveryPlugin, Notification};
use crate::notification::events::{
    DatasetChangedEvent, ExpectedRunEvent, MissingDatasetEvent, MissingValuesEvent,
    NotificationKind,
};
use crate::utils::http_client::build_http_client;
use crate::{Error, Result};

/// Webhook plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Webhook delivery plugin.
pub struct WebhookPlugin {
    client: Client,
}

impl WebhookPlugin {
    pub const METHOD: &'static str = "webhook";

    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { client })
    }

    fn parse_url(data: &str) -> Result<Url> {
        let url = Url::parse(data.trim())
            .map_err(|e| Error::delivery(Self::METHOD, format!("invalid URL '{}': {}", data, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::delivery(
                Self::METHOD,
                format!("unsupported URL scheme '{}'", scheme),
            )),
        }
    }
}

async fn post_json(client: &Client, url: &Url, payload: &Value) -> Result<()> {
    let response = client
        .post(url.clone())
        .json(payload)
        .send()
        .await
        .map_err(|e| Error::delivery(WebhookPlugin::METHOD, format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, %status, "Webhook delivery failed");
        return Err(Error::delivery(
            WebhookPlugin::METHOD,
            format!("{} - {}", status, body),
        ));
    }

    debug!(url = %url, "Webhook notification sent");
    Ok(())
}

#[async_trait]
impl DeliveryPlugin for WebhookPlugin {
    fn method(&self) -> &'static str {
        Self::METHOD
    }

    fn create(&self, recipient: &str, data: &str) -> Result<Box<dyn Notification>> {
        Ok(Box::new(WebhookNotification {
            recipient: recipient.to_string(),
            url: Self::parse_url(data)?,
            client: self.client.clone(),
        }))
    }

    async fn test(&self, data: &str) -> Result<()> {
        let url = Self::parse_url(data)?;
        let payload = json!({
            "kind": "test",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "message": "This is a test notification.",
        });
        post_json(&self.client, &url, &payload).await
    }
}

/// A webhook call addressed to one subscriber.
pub struct WebhookNotification {
    recipient: String,
    url: Url,
    client: Client,
}

impl WebhookNotification {
    fn build_payload(
        &self,
        kind: NotificationKind,
        test_id: i64,
        test_name: &str,
        data: Value,
    ) -> Value {
        json!({
            "kind": kind.to_string(),
            "recipient": self.recipient,
            "testId": test_id,
            "testName": test_name,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "data": data,
        })
    }

    async fn send(&self, payload: Value) -> Result<()> {
        post_json(&self.client, &self.url, &payload).await
    }
}

#[async_trait]
impl Notification for WebhookNotification {
    async fn notify_changes(&self, event: &DatasetChangedEvent) -> Result<()> {
        let payload = self.build_payload(
            NotificationKind::DatasetChanged,
            event.dataset.test_id,
            &event.test_name,
            serde_json::to_value(event)?,
        );
        self.send(payload).await
    }

    async fn notify_missing_values(
        &self,
        test_name: &str,
        fingerprint: Option<&str>,
        event: &MissingValuesEvent,
    ) -> Result<()> {
        let mut data = serde_json::to_value(event)?;
        data["fingerprint"] = json!(fingerprint);
        let payload = self.build_payload(
            NotificationKind::MissingValues,
            event.dataset.test_id,
            test_name,
            data,
        );
        self.send(payload).await
    }

    async fn notify_missing_dataset(&self, test_name: &str, event: &MissingDatasetEvent) -> Result<()> {
        let payload = self.build_payload(
            NotificationKind::MissingDataset,
            event.test_id,
            test_name,
            serde_json::to_value(event)?,
        );
        self.send(payload).await
    }

    async fn notify_expected_run(&self, test_name: &str, event: &ExpectedRunEvent) -> Result<()> {
        let payload = self.build_payload(
            NotificationKind::ExpectedRun,
            event.test_id,
            test_name,
            serde_json::to_value(event)?,
        );
        self.send(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_config_default() {
        let config = WebhookConfig::default();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(WebhookPlugin::parse_url("https://hooks.example.com/perf").is_ok());
        assert!(WebhookPlugin::parse_url("ftp://hooks.example.com/perf").is_err());
        assert!(WebhookPlugin::parse_url("not a url").is_err());
    }

    #[test]
    fn test_build_payload() {
        crate::utils::http_client::install_rustls_provider();
        let notification = WebhookNotification {
            recipient: "perf-team".to_string(),
            url: Url::parse("https://hooks.example.com/perf").unwrap(),
            client: Client::new(),
        };

        let payload = notification.build_payload(
            NotificationKind::MissingDataset,
            42,
            "throughput",
            json!({"rule_name": "nightly"}),
        );
        assert_eq!(payload["kind"], "missing_dataset");
        assert_eq!(payload["recipient"], "perf-team");
        assert_eq!(payload["testId"], 42);
        assert_eq!(payload["data"]["rule_name"], "nightly");
    }
}
