//! Notification settings repository.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::error;

use crate::Result;
use crate::database::models::{NotificationSettingsDbModel, Subscription};
use crate::database::{WritePool, begin_immediate};

/// Resolves every enabled notification target subscribed to a test: users
/// watching it, teams watching it, and members of teams watching it, minus
/// names opted out of that watch.
const FIND_SUBSCRIBERS: &str = r#"
    WITH ens AS (
        SELECT ns.method, ns.data, ns.name, wu.watch_id
        FROM notification_settings ns
        JOIN watch_users wu ON ns.is_team = 0 AND ns.name = wu.username
        WHERE ns.disabled = 0
        UNION
        SELECT ns.method, ns.data, ns.name, wt.watch_id
        FROM notification_settings ns
        JOIN watch_teams wt ON ns.is_team = 1 AND ns.name = wt.team_name
        WHERE ns.disabled = 0
        UNION
        SELECT ns.method, ns.data, ns.name, wt.watch_id
        FROM notification_settings ns
        JOIN team_membership tm ON ns.is_team = 0 AND ns.name = tm.username
        JOIN watch_teams wt ON wt.team_name = tm.team_name
        WHERE ns.disabled = 0
    )
    SELECT ens.method, ens.data, ens.name, ens.watch_id
    FROM ens
    JOIN watch w ON ens.watch_id = w.id
    WHERE w.test_id = ?
      AND ens.name NOT IN (
          SELECT wo.optout FROM watch_optout wo WHERE wo.watch_id = ens.watch_id
      )
    ORDER BY ens.name, ens.method
"#;

/// Notification settings repository trait.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_settings(
        &self,
        name: &str,
        is_team: bool,
    ) -> Result<Vec<NotificationSettingsDbModel>>;

    /// Replace every settings row of `(name, is_team)` with `settings`,
    /// all-or-nothing.
    async fn replace_settings(
        &self,
        name: &str,
        is_team: bool,
        settings: &[NotificationSettingsDbModel],
    ) -> Result<()>;

    async fn find_subscribers(&self, test_id: i64) -> Result<Vec<Subscription>>;
}

/// SQLx implementation of NotificationRepository.
pub struct SqlxNotificationRepository {
    pool: SqlitePool,
    write_pool: WritePool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: SqlitePool, write_pool: WritePool) -> Self {
        Self { pool, write_pool }
    }
}

fn decode_subscription(row: &sqlx::sqlite::SqliteRow) -> std::result::Result<Subscription, sqlx::Error> {
    Ok(Subscription {
        method: row.try_get("method")?,
        data: row.try_get("data")?,
        name: row.try_get("name")?,
        watch_id: row.try_get("watch_id")?,
    })
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn list_settings(
        &self,
        name: &str,
        is_team: bool,
    ) -> Result<Vec<NotificationSettingsDbModel>> {
        let settings = sqlx::query_as::<_, NotificationSettingsDbModel>(
            "SELECT * FROM notification_settings WHERE name = ? AND is_team = ? ORDER BY id",
        )
        .bind(name)
        .bind(is_team)
        .fetch_all(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn replace_settings(
        &self,
        name: &str,
        is_team: bool,
        settings: &[NotificationSettingsDbModel],
    ) -> Result<()> {
        let mut tx = begin_immediate(&self.write_pool).await?;

        sqlx::query("DELETE FROM notification_settings WHERE name = ? AND is_team = ?")
            .bind(name)
            .bind(is_team)
            .execute(&mut *tx)
            .await?;

        for ns in settings {
            sqlx::query(
                r#"
                INSERT INTO notification_settings (name, is_team, method, data, disabled)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(name)
            .bind(is_team)
            .bind(&ns.method)
            .bind(&ns.data)
            .bind(ns.disabled)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_subscribers(&self, test_id: i64) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(FIND_SUBSCRIBERS)
            .bind(test_id)
            .fetch_all(&self.pool)
            .await?;

        let mut subscriptions = Vec::with_capacity(rows.len());
        for row in &rows {
            match decode_subscription(row) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(e) => {
                    error!(test_id, error = %e, "Unexpected subscriber row, skipping");
                }
            }
        }
        Ok(subscriptions)
    }
}
