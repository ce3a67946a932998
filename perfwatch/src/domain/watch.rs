//! Who watches a test.

use serde::{Deserialize, Serialize};

/// Users and teams notified about a test, plus names opted out of it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Watch {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "testId", default)]
    pub test_id: i64,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub optout: Vec<String>,
}

impl Watch {
    pub fn empty(test_id: i64) -> Self {
        Self {
            test_id,
            ..Default::default()
        }
    }
}
