//! Delivery plugins.
//!
//! This module provides the transports notifications are delivered through:
//! - Email (rendered messages handed to a [`Mailer`])
//! - Generic webhooks (HTTP POST of a JSON payload)
//!
//! A plugin is keyed by its method name. For each subscriber it creates a
//! [`Notification`] bound to that recipient and their configuration, and the
//! service then invokes the notifier matching the event kind.

mod email;
mod webhook;

pub use email::{EmailConfig, EmailPlugin, LoggingMailer, Mailer, OutgoingEmail};
pub use webhook::{WebhookConfig, WebhookPlugin};

use async_trait::async_trait;

use super::events::{DatasetChangedEvent, ExpectedRunEvent, MissingDatasetEvent, MissingValuesEvent};
use crate::Result;

/// A delivery transport, registered once at startup.
#[async_trait]
pub trait DeliveryPlugin: Send + Sync {
    /// Unique method name, e.g. "email".
    fn method(&self) -> &'static str;

    /// Bind a notification to one recipient and its opaque configuration.
    fn create(&self, recipient: &str, data: &str) -> Result<Box<dyn Notification>>;

    /// Send a test message using `data` as configuration.
    async fn test(&self, data: &str) -> Result<()>;
}

/// A notification addressed to one recipient.
#[async_trait]
pub trait Notification: Send + Sync {
    async fn notify_changes(&self, event: &DatasetChangedEvent) -> Result<()>;

    async fn notify_missing_values(
        &self,
        test_name: &str,
        fingerprint: Option<&str>,
        event: &MissingValuesEvent,
    ) -> Result<()>;

    async fn notify_missing_dataset(&self, test_name: &str, event: &MissingDatasetEvent) -> Result<()>;

    async fn notify_expected_run(&self, test_name: &str, event: &ExpectedRunEvent) -> Result<()>;
}
