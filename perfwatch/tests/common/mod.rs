//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use perfwatch::database::repositories::{
    SqlxNotificationRepository, SqlxTeamRepository, SqlxTestRepository, SqlxWatchRepository,
};
use perfwatch::database::{DbPool, init_pool_with_size, run_migrations};
use perfwatch::notification::events::{
    DatasetChangedEvent, ExpectedRunEvent, MissingDatasetEvent, MissingValuesEvent,
};
use perfwatch::notification::{DeliveryPlugin, Notification, NotificationService, PluginRegistry};
use perfwatch::{Error, Result};

/// In-memory database with migrations applied.
///
/// Each in-memory connection is its own database, so the pool holds exactly
/// one connection and serves as both read and write pool.
pub async fn setup_test_db() -> DbPool {
    let pool = init_pool_with_size("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Insert a test row; tests are owned by the upstream tracker.
pub async fn seed_test(pool: &DbPool, name: &str, owner: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO test (name, owner) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(owner)
        .fetch_one(pool)
        .await
        .expect("Failed to insert test")
}

/// Insert a dataset row of `test_id`.
pub async fn seed_dataset(pool: &DbPool, test_id: i64, run_id: i64, fingerprint: Option<&str>) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO dataset (test_id, run_id, ordinal, fingerprint) VALUES (?, ?, 0, ?) RETURNING id",
    )
    .bind(test_id)
    .bind(run_id)
    .bind(fingerprint)
    .fetch_one(pool)
    .await
    .expect("Failed to insert dataset")
}

/// One observed plugin interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        method: String,
        recipient: String,
        data: String,
    },
    Notify {
        method: String,
        recipient: String,
        kind: String,
        test_name: String,
    },
    Test {
        method: String,
        data: String,
    },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Plugin that records every call instead of delivering anything.
pub struct RecordingPlugin {
    method: &'static str,
    calls: CallLog,
    fail_tests: bool,
}

impl RecordingPlugin {
    pub fn new(method: &'static str, calls: CallLog) -> Self {
        Self {
            method,
            calls,
            fail_tests: false,
        }
    }

    pub fn failing_tests(mut self) -> Self {
        self.fail_tests = true;
        self
    }
}

#[async_trait]
impl DeliveryPlugin for RecordingPlugin {
    fn method(&self) -> &'static str {
        self.method
    }

    fn create(&self, recipient: &str, data: &str) -> Result<Box<dyn Notification>> {
        self.calls.lock().unwrap().push(Call::Create {
            method: self.method.to_string(),
            recipient: recipient.to_string(),
            data: data.to_string(),
        });
        Ok(Box::new(RecordingNotification {
            method: self.method,
            recipient: recipient.to_string(),
            calls: self.calls.clone(),
        }))
    }

    async fn test(&self, data: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Test {
            method: self.method.to_string(),
            data: data.to_string(),
        });
        if self.fail_tests {
            Err(Error::delivery(self.method, "test delivery refused"))
        } else {
            Ok(())
        }
    }
}

struct RecordingNotification {
    method: &'static str,
    recipient: String,
    calls: CallLog,
}

impl RecordingNotification {
    fn record(&self, kind: &str, test_name: &str) {
        self.calls.lock().unwrap().push(Call::Notify {
            method: self.method.to_string(),
            recipient: self.recipient.clone(),
            kind: kind.to_string(),
            test_name: test_name.to_string(),
        });
    }
}

#[async_trait]
impl Notification for RecordingNotification {
    async fn notify_changes(&self, event: &DatasetChangedEvent) -> Result<()> {
        self.record("dataset_changed", &event.test_name);
        Ok(())
    }

    async fn notify_missing_values(
        &self,
        test_name: &str,
        _fingerprint: Option<&str>,
        _event: &MissingValuesEvent,
    ) -> Result<()> {
        self.record("missing_values", test_name);
        Ok(())
    }

    async fn notify_missing_dataset(&self, test_name: &str, _event: &MissingDatasetEvent) -> Result<()> {
        self.record("missing_dataset", test_name);
        Ok(())
    }

    async fn notify_expected_run(&self, test_name: &str, _event: &ExpectedRunEvent) -> Result<()> {
        self.record("expected_run", test_name);
        Ok(())
    }
}

/// Everything a dispatch test needs, wired to one in-memory database.
pub struct Harness {
    pub pool: DbPool,
    pub calls: CallLog,
    pub service: Arc<NotificationService>,
    pub notifications: Arc<SqlxNotificationRepository>,
    pub watches: Arc<SqlxWatchRepository>,
    pub teams: Arc<SqlxTeamRepository>,
    pub tests: Arc<SqlxTestRepository>,
}

impl Harness {
    /// `email` and `webhook` recording plugins.
    pub async fn new() -> Self {
        let calls: CallLog = Arc::default();
        let plugins: Vec<Arc<dyn DeliveryPlugin>> = vec![
            Arc::new(RecordingPlugin::new("email", calls.clone())),
            Arc::new(RecordingPlugin::new("webhook", calls.clone())),
        ];
        Self::with_plugins(plugins, calls).await
    }

    pub async fn with_plugins(plugins: Vec<Arc<dyn DeliveryPlugin>>, calls: CallLog) -> Self {
        let pool = setup_test_db().await;
        let notifications = Arc::new(SqlxNotificationRepository::new(pool.clone(), pool.clone()));
        let watches = Arc::new(SqlxWatchRepository::new(pool.clone(), pool.clone()));
        let teams = Arc::new(SqlxTeamRepository::new(pool.clone(), pool.clone()));
        let tests = Arc::new(SqlxTestRepository::new(pool.clone()));
        let service = Arc::new(NotificationService::new(
            Arc::new(PluginRegistry::new(plugins)),
            notifications.clone(),
            tests.clone(),
        ));
        Self {
            pool,
            calls,
            service,
            notifications,
            watches,
            teams,
            tests,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}
