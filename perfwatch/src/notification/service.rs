//! Notification service implementation.
//!
//! The NotificationService is responsible for:
//! - Resolving the subscribers of a test and dispatching events to them
//! - Managing per-user and per-team notification settings
//! - Running delivery plugin self-tests

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::channels::Notification;
use super::events::{
    DatasetChangedEvent, ExpectedRunEvent, MissingDatasetEvent, MissingValuesEvent,
};
use super::registry::PluginRegistry;
use crate::database::repositories::{NotificationRepository, TestRepository};
use crate::domain::NotificationSettings;
use crate::error::SelfTestFailure;
use crate::{Error, Result};

const UNKNOWN_TEST: &str = "<unknown test>";

/// The notification service.
pub struct NotificationService {
    registry: Arc<PluginRegistry>,
    notification_repo: Arc<dyn NotificationRepository>,
    test_repo: Arc<dyn TestRepository>,
}

impl NotificationService {
    pub fn new(
        registry: Arc<PluginRegistry>,
        notification_repo: Arc<dyn NotificationRepository>,
        test_repo: Arc<dyn TestRepository>,
    ) -> Self {
        Self {
            registry,
            notification_repo,
            test_repo,
        }
    }

    /// Resolve the subscribers of `test_id` and hand each one's notification
    /// to `dispatch`. Returns how many notifications were dispatched.
    ///
    /// Subscribers whose method has no registered plugin are logged and
    /// skipped. Plugin failures abort the loop and are returned.
    pub async fn notify_all<F, Fut>(&self, test_id: i64, dispatch: F) -> Result<usize>
    where
        F: Fn(Box<dyn Notification>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let subscribers = self.notification_repo.find_subscribers(test_id).await?;
        if subscribers.is_empty() {
            info!(test_id, "There are no subscribers for notification on test");
            return Ok(0);
        }

        let mut dispatched = 0;
        for subscriber in subscribers {
            if subscriber.name.is_empty() || subscriber.method.is_empty() {
                error!(test_id, ?subscriber, "Skipping malformed subscription");
                continue;
            }
            let Some(plugin) = self.registry.get(&subscriber.method) else {
                error!(
                    test_id,
                    recipient = %subscriber.name,
                    method = %subscriber.method,
                    data = %subscriber.data,
                    "Cannot notify; no plugin for method"
                );
                continue;
            };

            let notification = plugin.create(&subscriber.name, &subscriber.data)?;
            dispatch(notification).await?;
            dispatched += 1;
        }

        debug!(test_id, dispatched, "Notifications dispatched");
        Ok(dispatched)
    }

    /// Display name of a test, or `fallback` when it no longer exists.
    async fn test_name_or(&self, test_id: i64, fallback: &str) -> Result<String> {
        Ok(self
            .test_repo
            .find_test_name(test_id)
            .await?
            .unwrap_or_else(|| fallback.to_string()))
    }

    pub async fn notify_dataset_changed(&self, event: &DatasetChangedEvent) -> Result<usize> {
        if !event.notify {
            debug!("Notification skipped");
            return Ok(0);
        }
        debug!(
            test_id = event.dataset.test_id,
            test_name = %event.test_name,
            run_id = event.dataset.run_id,
            ordinal = event.dataset.ordinal,
            fingerprint = ?event.fingerprint,
            "Received new changes"
        );
        self.notify_all(event.dataset.test_id, |n| async move {
            n.notify_changes(event).await
        })
        .await
    }

    pub async fn notify_missing_values(&self, event: &MissingValuesEvent) -> Result<usize> {
        if !event.notify {
            debug!(
                test_id = event.dataset.test_id,
                dataset_id = event.dataset.id,
                "Skipping notification for missing run values"
            );
            return Ok(0);
        }
        let test_name = self.test_name_or(event.dataset.test_id, "unknown").await?;
        debug!(
            test_id = event.dataset.test_id,
            test_name = %test_name,
            dataset_id = event.dataset.id,
            variables = ?event.variables,
            "Received missing values event"
        );

        let fingerprint = self.test_repo.find_fingerprint(event.dataset.id).await?;
        let test_name = test_name.as_str();
        let fingerprint = fingerprint.as_deref();
        self.notify_all(event.dataset.test_id, |n| async move {
            n.notify_missing_values(test_name, fingerprint, event).await
        })
        .await
    }

    pub async fn notify_missing_dataset(&self, event: &MissingDatasetEvent) -> Result<usize> {
        let test_name = self.test_name_or(event.test_id, UNKNOWN_TEST).await?;
        let test_name = test_name.as_str();
        self.notify_all(event.test_id, |n| async move {
            n.notify_missing_dataset(test_name, event).await
        })
        .await
    }

    pub async fn notify_expected_run(&self, event: &ExpectedRunEvent) -> Result<usize> {
        let test_name = self.test_name_or(event.test_id, UNKNOWN_TEST).await?;
        let test_name = test_name.as_str();
        self.notify_all(event.test_id, |n| async move {
            n.notify_expected_run(test_name, event).await
        })
        .await
    }

    /// Registered delivery method names.
    pub fn methods(&self) -> Vec<String> {
        self.registry.methods()
    }

    pub async fn settings(&self, name: &str, is_team: bool) -> Result<Vec<NotificationSettings>> {
        let rows = self.notification_repo.list_settings(name, is_team).await?;
        Ok(rows.into_iter().map(NotificationSettings::from).collect())
    }

    /// Replace all settings of `(name, is_team)`. Every method is checked
    /// against the registry before anything is written.
    pub async fn update_settings(
        &self,
        name: &str,
        is_team: bool,
        settings: Vec<NotificationSettings>,
    ) -> Result<()> {
        if let Some(invalid) = settings.iter().find(|s| !self.registry.contains(&s.method)) {
            warn!(name, is_team, method = %invalid.method, "Rejecting settings with unknown method");
            return Err(Error::InvalidMethod(invalid.method.clone()));
        }

        let rows: Vec<_> = settings
            .into_iter()
            .map(|s| s.into_db_model(name, is_team))
            .collect();
        self.notification_repo
            .replace_settings(name, is_team, &rows)
            .await?;

        info!(name, is_team, count = rows.len(), "Notification settings updated");
        Ok(())
    }

    /// Run delivery self-tests with `data` as configuration.
    ///
    /// Without a method every registered plugin is tested; a failure does not
    /// stop the remaining plugins and all failures are reported together.
    pub async fn test_notifications(&self, method: Option<&str>, data: &str) -> Result<()> {
        match method {
            Some(method) => {
                let plugin = self
                    .registry
                    .get(method)
                    .ok_or_else(|| Error::MethodUnavailable(method.to_string()))?;
                plugin.test(data).await
            }
            None => {
                let mut failures = Vec::new();
                for plugin in self.registry.plugins() {
                    if let Err(e) = plugin.test(data).await {
                        warn!(method = plugin.method(), error = %e, "Notification self-test failed");
                        failures.push(SelfTestFailure {
                            method: plugin.method().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(Error::SelfTests(failures))
                }
            }
        }
    }
}
