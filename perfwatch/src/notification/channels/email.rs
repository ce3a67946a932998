//! Email delivery plugin.
//!
//! The plugin renders subject and body; actually handing the message to an
//! SMTP relay is the job of a [`Mailer`].

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{DeliveryPlugin, Notification};
use crate::notification::events::{
    DatasetChangedEvent, ExpectedRunEvent, MissingDatasetEvent, MissingValuesEvent,
};
use crate::{Error, Result};

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("address pattern is valid")
});

/// Email plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Sender address.
    pub from_address: String,
    /// Prepended to every subject.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// Base URL used to build links back to tests.
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_subject_prefix() -> String {
    "[perfwatch]".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "perfwatch@localhost".to_string(),
            subject_prefix: default_subject_prefix(),
            public_url: None,
        }
    }
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Transport that hands a rendered email to a mail relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Mailer that only logs outgoing messages. Used when no relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "Email notification (no relay configured)"
        );
        debug!(body = %email.body, "Email body");
        Ok(())
    }
}

/// Email delivery plugin.
pub struct EmailPlugin {
    config: Arc<EmailConfig>,
    mailer: Arc<dyn Mailer>,
}

impl EmailPlugin {
    pub const METHOD: &'static str = "email";

    pub fn new(config: EmailConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config: Arc::new(config),
            mailer,
        }
    }

    fn parse_address(data: &str) -> Result<String> {
        let address = data.trim();
        if ADDRESS_RE.is_match(address) {
            Ok(address.to_string())
        } else {
            Err(Error::delivery(
                Self::METHOD,
                format!("'{}' is not a valid email address", address),
            ))
        }
    }
}

#[async_trait]
impl DeliveryPlugin for EmailPlugin {
    fn method(&self) -> &'static str {
        Self::METHOD
    }

    fn create(&self, recipient: &str, data: &str) -> Result<Box<dyn Notification>> {
        Ok(Box::new(EmailNotification {
            recipient: recipient.to_string(),
            address: Self::parse_address(data)?,
            config: self.config.clone(),
            mailer: self.mailer.clone(),
        }))
    }

    async fn test(&self, data: &str) -> Result<()> {
        let address = Self::parse_address(data)?;
        self.mailer
            .send(OutgoingEmail {
                from: self.config.from_address.clone(),
                to: address,
                subject: format!("{} Test notification", self.config.subject_prefix),
                body: "This is a test notification. Your email settings work.".to_string(),
            })
            .await
    }
}

/// An email addressed to one subscriber.
pub struct EmailNotification {
    recipient: String,
    address: String,
    config: Arc<EmailConfig>,
    mailer: Arc<dyn Mailer>,
}

impl EmailNotification {
    fn test_link(&self, test_id: i64) -> Option<String> {
        self.config
            .public_url
            .as_deref()
            .map(|base| format!("{}/test/{}", base.trim_end_matches('/'), test_id))
    }

    fn greeting(&self) -> String {
        format!("Hello {},\n\n", self.recipient)
    }

    async fn deliver(&self, subject: String, body: String) -> Result<()> {
        self.mailer
            .send(OutgoingEmail {
                from: self.config.from_address.clone(),
                to: self.address.clone(),
                subject: format!("{} {}", self.config.subject_prefix, subject),
                body,
            })
            .await
    }

    pub(crate) fn render_changes(&self, event: &DatasetChangedEvent) -> (String, String) {
        let subject = format!("Change in {}", event.test_name);
        let mut body = self.greeting();
        let _ = writeln!(
            body,
            "New changes were detected in test {}, run {} (dataset #{}).",
            event.test_name, event.dataset.run_id, event.dataset.ordinal
        );
        if let Some(fingerprint) = &event.fingerprint {
            let _ = writeln!(body, "Fingerprint: {}", fingerprint);
        }
        body.push('\n');
        for change in &event.changes {
            let _ = writeln!(
                body,
                "* {} ({}): {}",
                change.variable,
                change.timestamp.to_rfc3339(),
                change.description
            );
        }
        if let Some(link) = self.test_link(event.dataset.test_id) {
            let _ = writeln!(body, "\n{}", link);
        }
        (subject, body)
    }

    pub(crate) fn render_missing_values(
        &self,
        test_name: &str,
        fingerprint: Option<&str>,
        event: &MissingValuesEvent,
    ) -> (String, String) {
        let subject = format!("Missing change detection values in {}", test_name);
        let mut body = self.greeting();
        let _ = writeln!(
            body,
            "Dataset {}/{} of test {} is missing values for: {}",
            event.dataset.run_id,
            event.dataset.ordinal,
            test_name,
            event.variables.join(", ")
        );
        if let Some(fingerprint) = fingerprint {
            let _ = writeln!(body, "Fingerprint: {}", fingerprint);
        }
        if let Some(link) = self.test_link(event.dataset.test_id) {
            let _ = writeln!(body, "\n{}", link);
        }
        (subject, body)
    }

    pub(crate) fn render_missing_dataset(&self, test_name: &str, event: &MissingDatasetEvent) -> (String, String) {
        let subject = format!("Missing expected data for {}", test_name);
        let mut body = self.greeting();
        let rule = event.rule_name.as_deref().unwrap_or("<unnamed rule>");
        let _ = writeln!(
            body,
            "Test {} has not received a dataset within {} (rule {}).",
            test_name,
            humanize_millis(event.max_staleness),
            rule
        );
        match event.last_timestamp {
            Some(ts) => {
                let _ = writeln!(body, "The last dataset arrived at {}.", ts.to_rfc3339());
            }
            None => body.push_str("No dataset has been received yet.\n"),
        }
        if let Some(link) = self.test_link(event.test_id) {
            let _ = writeln!(body, "\n{}", link);
        }
        (subject, body)
    }

    pub(crate) fn render_expected_run(&self, test_name: &str, event: &ExpectedRunEvent) -> (String, String) {
        let subject = format!("Expected run for {} has not arrived", test_name);
        let mut body = self.greeting();
        let _ = writeln!(
            body,
            "A run of test {} was expected before {}.",
            test_name,
            event.expected_before.to_rfc3339()
        );
        if let Some(by) = &event.expected_by {
            let _ = writeln!(body, "It was announced by {}.", by);
        }
        if let Some(backlink) = &event.backlink {
            let _ = writeln!(body, "Details: {}", backlink);
        }
        (subject, body)
    }
}

fn humanize_millis(millis: i64) -> String {
    let secs = millis / 1000;
    match secs {
        s if s >= 86_400 && s % 86_400 == 0 => format!("{} day(s)", s / 86_400),
        s if s >= 3_600 && s % 3_600 == 0 => format!("{} hour(s)", s / 3_600),
        s if s >= 60 && s % 60 == 0 => format!("{} minute(s)", s / 60),
        s => format!("{} second(s)", s),
    }
}

#[async_trait]
impl Notification for EmailNotification {
    async fn notify_changes(&self, event: &DatasetChangedEvent) -> Result<()> {
        let (subject, body) = self.render_changes(event);
        self.deliver(subject, body).await
    }

    async fn notify_missing_values(
        &self,
        test_name: &str,
        fingerprint: Option<&str>,
        event: &MissingValuesEvent,
    ) -> Result<()> {
        let (subject, body) = self.render_missing_values(test_name, fingerprint, event);
        self.deliver(subject, body).await
    }

    async fn notify_missing_dataset(&self, test_name: &str, event: &MissingDatasetEvent) -> Result<()> {
        let (subject, body) = self.render_missing_dataset(test_name, event);
        self.deliver(subject, body).await
    }

    async fn notify_expected_run(&self, test_name: &str, event: &ExpectedRunEvent) -> Result<()> {
        let (subject, body) = self.render_expected_run(test_name, event);
        self.deliver(subject, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::events::{Change, DatasetRef};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<()> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    fn plugin(mailer: Arc<RecordingMailer>) -> EmailPlugin {
        EmailPlugin::new(
            EmailConfig {
                from_address: "perfwatch@example.com".to_string(),
                subject_prefix: "[perfwatch]".to_string(),
                public_url: Some("https://perf.example.com/".to_string()),
            },
            mailer,
        )
    }

    fn dataset() -> DatasetRef {
        DatasetRef {
            id: 11,
            run_id: 101,
            ordinal: 0,
            test_id: 42,
        }
    }

    #[test]
    fn test_create_rejects_invalid_address() {
        let plugin = plugin(Arc::new(RecordingMailer::default()));
        let err = plugin.create("alice", "not-an-address").err().unwrap();
        assert!(matches!(err, Error::Delivery { ref method, .. } if method == "email"));
    }

    #[tokio::test]
    async fn test_changes_email_contents() {
        let mailer = Arc::new(RecordingMailer::default());
        let plugin = plugin(mailer.clone());
        let notification = plugin.create("alice", " alice@example.com ").unwrap();

        let event = DatasetChangedEvent {
            dataset: dataset(),
            test_name: "throughput".to_string(),
            fingerprint: Some("{\"cpu\":8}".to_string()),
            changes: vec![Change {
                variable: "requests/s".to_string(),
                description: "dropped by 12%".to_string(),
                timestamp: chrono::Utc::now(),
            }],
            notify: true,
        };
        notification.notify_changes(&event).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "[perfwatch] Change in throughput");
        assert!(sent[0].body.starts_with("Hello alice"));
        assert!(sent[0].body.contains("requests/s"));
        assert!(sent[0].body.contains("https://perf.example.com/test/42"));
    }

    #[tokio::test]
    async fn test_missing_dataset_without_previous_data() {
        let mailer = Arc::new(RecordingMailer::default());
        let notification = plugin(mailer.clone())
            .create("perf-team", "perf@example.com")
            .unwrap();

        let event = MissingDatasetEvent {
            test_id: 42,
            rule_name: Some("nightly".to_string()),
            max_staleness: 2 * 86_400_000,
            last_timestamp: None,
        };
        notification
            .notify_missing_dataset("throughput", &event)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].body.contains("2 day(s)"));
        assert!(sent[0].body.contains("No dataset has been received yet"));
    }

    #[tokio::test]
    async fn test_self_test_sends_to_address() {
        let mailer = Arc::new(RecordingMailer::default());
        plugin(mailer.clone()).test("ops@example.com").await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].from, "perfwatch@example.com");
    }

    #[test]
    fn test_humanize_millis() {
        assert_eq!(humanize_millis(86_400_000), "1 day(s)");
        assert_eq!(humanize_millis(7_200_000), "2 hour(s)");
        assert_eq!(humanize_millis(90_000), "90 second(s)");
    }
}
