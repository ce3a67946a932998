//! Persistence layer on SQLite.
//!
//! Reads go through a pooled connection set; every write goes through a
//! separate single-connection pool so writers queue in-process instead of
//! fighting over the SQLite lock.

pub mod models;
pub mod repositories;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite, Transaction};

/// Read pool.
pub type DbPool = Pool<Sqlite>;

/// Write pool, always exactly one connection.
pub type WritePool = Pool<Sqlite>;

/// Transaction holding the database write lock from its first statement.
pub type ImmediateTransaction = Transaction<'static, Sqlite>;

const MAX_READ_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true)
        .pragma("temp_store", "memory")
        .create_if_missing(true))
}

async fn connect(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(connect_options(database_url)?)
        .await
}

/// Read pool sized from the available cores.
pub async fn init_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(2);
    init_pool_with_size(database_url, (cores * 2).min(MAX_READ_CONNECTIONS)).await
}

/// Read pool with an explicit size.
///
/// `sqlite::memory:` databases are private to one connection, so tests use
/// a size of 1 and the same pool for reads and writes.
pub async fn init_pool_with_size(
    database_url: &str,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    let pool = connect(database_url, max_connections, Duration::from_secs(30)).await?;
    tracing::info!(max_connections, "Read pool ready");
    Ok(pool)
}

/// Single-connection pool for all writes.
pub async fn init_write_pool(database_url: &str) -> Result<WritePool, sqlx::Error> {
    let pool = connect(database_url, 1, Duration::from_secs(60)).await?;
    tracing::info!("Write pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::debug!("Applying migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema up to date");
    Ok(())
}

/// Open a `BEGIN IMMEDIATE` transaction on the write pool.
///
/// Taking the lock upfront means a replace-all of settings or watch lists
/// never fails halfway on a lock upgrade. Dropping the transaction without
/// committing rolls it back.
pub async fn begin_immediate(pool: &WritePool) -> Result<ImmediateTransaction, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn migrated_pool() -> DbPool {
        let pool = init_pool_with_size("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let pool = migrated_pool().await;

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();

        for expected in [
            "notification_settings",
            "watch",
            "watch_users",
            "watch_teams",
            "watch_optout",
            "team_membership",
            "test",
            "dataset",
        ] {
            assert!(names.contains(&expected), "{} table missing", expected);
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let pool = migrated_pool().await;

        {
            let mut tx = begin_immediate(&pool).await.unwrap();
            sqlx::query("INSERT INTO test (name, owner) VALUES ('discarded', 'perf-team')")
                .execute(&mut *tx)
                .await
                .unwrap();
        }

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM test")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_committed_transaction_persists() {
        let pool = migrated_pool().await;

        let mut tx = begin_immediate(&pool).await.unwrap();
        sqlx::query("INSERT INTO test (name, owner) VALUES ('kept', 'perf-team')")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let name: (String,) = sqlx::query_as("SELECT name FROM test")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name.0, "kept");
    }
}
