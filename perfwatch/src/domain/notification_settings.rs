//! Notification settings as seen by API clients.

use serde::{Deserialize, Serialize};

use crate::database::models::NotificationSettingsDbModel;

/// A delivery target owned by a user or a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Assigned by the store; ignored on update.
    #[serde(default)]
    pub id: Option<i64>,
    /// Owner name; overwritten by the owner being updated.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_team: bool,
    pub method: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub disabled: bool,
}

impl From<NotificationSettingsDbModel> for NotificationSettings {
    fn from(model: NotificationSettingsDbModel) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            is_team: model.is_team,
            method: model.method,
            data: model.data,
            disabled: model.disabled,
        }
    }
}

impl NotificationSettings {
    /// Map to a row owned by `(name, is_team)`.
    pub fn into_db_model(self, name: &str, is_team: bool) -> NotificationSettingsDbModel {
        NotificationSettingsDbModel {
            id: 0,
            name: name.to_string(),
            is_team,
            method: self.method,
            data: self.data,
            disabled: self.disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let settings: NotificationSettings =
            serde_json::from_str(r#"{"method":"email","data":"alice@example.com"}"#).unwrap();
        assert_eq!(settings.id, None);
        assert_eq!(settings.method, "email");
        assert!(!settings.is_team);
        assert!(!settings.disabled);
    }

    #[test]
    fn test_into_db_model_overrides_owner() {
        let settings = NotificationSettings {
            id: Some(7),
            name: "mallory".to_string(),
            is_team: false,
            method: "webhook".to_string(),
            data: "https://hooks.example.com/x".to_string(),
            disabled: true,
        };
        let model = settings.into_db_model("perf-team", true);
        assert_eq!(model.name, "perf-team");
        assert!(model.is_team);
        assert_eq!(model.id, 0);
        assert!(model.disabled);
    }

    #[test]
    fn test_camel_case_serialization() {
        let settings = NotificationSettings {
            id: Some(1),
            name: "perf-team".to_string(),
            is_team: true,
            method: "email".to_string(),
            data: "perf@example.com".to_string(),
            disabled: false,
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["isTeam"], true);
    }
}
