//! Notification events.
//!
//! Events are built by upstream producers (change detection, missing value
//! checks, staleness and expected-run schedulers) and consumed synchronously
//! by the notification service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of events a delivery plugin must be able to notify about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    DatasetChanged,
    MissingValues,
    MissingDataset,
    ExpectedRun,
}

/// Reference to the dataset an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub id: i64,
    pub run_id: i64,
    pub ordinal: i32,
    pub test_id: i64,
}

/// A detected change in one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub variable: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// New changes were detected in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetChangedEvent {
    pub dataset: DatasetRef,
    pub test_name: String,
    pub fingerprint: Option<String>,
    pub changes: Vec<Change>,
    /// Cleared by producers that already notified about the same change.
    pub notify: bool,
}

/// A dataset is missing values for some variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingValuesEvent {
    pub dataset: DatasetRef,
    pub variables: Vec<String>,
    pub notify: bool,
}

/// No dataset arrived within a staleness rule's window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingDatasetEvent {
    pub test_id: i64,
    pub rule_name: Option<String>,
    /// Maximum allowed staleness in milliseconds.
    pub max_staleness: i64,
    pub last_timestamp: Option<DateTime<Utc>>,
}

/// A run that was announced as expected did not arrive in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedRunEvent {
    pub test_id: i64,
    pub expected_before: DateTime<Utc>,
    pub expected_by: Option<String>,
    pub backlink: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_display() {
        assert_eq!(NotificationKind::DatasetChanged.to_string(), "dataset_changed");
        assert_eq!(
            NotificationKind::from_str("expected_run").unwrap(),
            NotificationKind::ExpectedRun
        );
    }

    #[test]
    fn test_missing_dataset_roundtrip_keeps_optional_rule() {
        let event = MissingDatasetEvent {
            test_id: 3,
            rule_name: None,
            max_staleness: 86_400_000,
            last_timestamp: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: MissingDatasetEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
