//! Notification database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Notification settings database model.
/// One delivery target owned by a user (`is_team = false`) or a team.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct NotificationSettingsDbModel {
    pub id: i64,
    /// User or team name owning this row
    pub name: String,
    pub is_team: bool,
    /// Delivery plugin method name, e.g. "email"
    pub method: String,
    /// Plugin-specific configuration, opaque to the store
    pub data: String,
    pub disabled: bool,
}

impl NotificationSettingsDbModel {
    pub fn new(
        name: impl Into<String>,
        is_team: bool,
        method: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            is_team,
            method: method.into(),
            data: data.into(),
            disabled: false,
        }
    }
}

/// One resolved recipient of a notification for a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub method: String,
    pub data: String,
    /// User or team name the notification is addressed to
    pub name: String,
    pub watch_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_new() {
        let settings = NotificationSettingsDbModel::new("alice", false, "email", "alice@example.com");
        assert_eq!(settings.id, 0);
        assert!(!settings.is_team);
        assert!(!settings.disabled);
        assert_eq!(settings.method, "email");
    }
}
