//! Team membership repository.
//!
//! Members of a team watching a test are notified through their own user
//! settings, so this table feeds the subscriber query.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::WritePool;

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn add_member(&self, team_name: &str, username: &str) -> Result<()>;
    async fn remove_member(&self, team_name: &str, username: &str) -> Result<()>;
    /// Members of `team_name`, sorted.
    async fn members(&self, team_name: &str) -> Result<Vec<String>>;
    async fn teams_of(&self, username: &str) -> Result<Vec<String>>;
}

pub struct SqlxTeamRepository {
    pool: SqlitePool,
    write_pool: WritePool,
}

impl SqlxTeamRepository {
    pub fn new(pool: SqlitePool, write_pool: WritePool) -> Self {
        Self { pool, write_pool }
    }
}

#[async_trait]
impl TeamRepository for SqlxTeamRepository {
    async fn add_member(&self, team_name: &str, username: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO team_membership (team_name, username) VALUES (?, ?)")
            .bind(team_name)
            .bind(username)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }

    async fn remove_member(&self, team_name: &str, username: &str) -> Result<()> {
        sqlx::query("DELETE FROM team_membership WHERE team_name = ? AND username = ?")
            .bind(team_name)
            .bind(username)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }

    async fn members(&self, team_name: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT username FROM team_membership WHERE team_name = ? ORDER BY username",
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(u,)| u).collect())
    }

    async fn teams_of(&self, username: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT team_name FROM team_membership WHERE username = ? ORDER BY team_name",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{init_pool_with_size, init_write_pool, run_migrations};

    #[tokio::test]
    async fn test_membership_writes_use_write_pool() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("teams.db").display());
        let write_pool = init_write_pool(&url).await.unwrap();
        run_migrations(&write_pool).await.unwrap();
        let pool = init_pool_with_size(&url, 2).await.unwrap();
        let repo = SqlxTeamRepository::new(pool.clone(), write_pool.clone());

        // Hold the only write connection: a write through it must wait.
        let held = write_pool.acquire().await.unwrap();
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            repo.add_member("perf-team", "alice"),
        )
        .await;
        assert!(pending.is_err());
        drop(held);

        repo.add_member("perf-team", "alice").await.unwrap();
        repo.add_member("qe-team", "alice").await.unwrap();
        assert_eq!(repo.members("perf-team").await.unwrap(), vec!["alice"]);
        assert_eq!(repo.teams_of("alice").await.unwrap(), vec!["perf-team", "qe-team"]);

        repo.remove_member("perf-team", "alice").await.unwrap();
        assert!(repo.members("perf-team").await.unwrap().is_empty());
    }
}
