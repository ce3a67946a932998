//! Watch database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Watch database model. Exactly one per watched test.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WatchDbModel {
    pub id: i64,
    pub test_id: i64,
}

/// Which side table of a watch a name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum WatchList {
    Users,
    Teams,
    Optout,
}

impl WatchList {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Users => "watch_users",
            Self::Teams => "watch_teams",
            Self::Optout => "watch_optout",
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Users => "username",
            Self::Teams => "team_name",
            Self::Optout => "optout",
        }
    }
}
