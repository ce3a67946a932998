//! Watch (subscription) repository.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use crate::Result;
use crate::database::models::{WatchDbModel, WatchList};
use crate::database::{WritePool, begin_immediate};
use crate::domain::Watch;

#[async_trait]
pub trait WatchRepository: Send + Sync {
    /// Watch of a test; empty lists when nobody watches it yet.
    async fn get_watch(&self, test_id: i64) -> Result<Watch>;
    /// Replace users, teams and opt-outs of the test's watch.
    async fn replace_watch(&self, watch: &Watch) -> Result<Watch>;
    /// Add a name to one list. Adding a user or team clears a matching opt-out.
    async fn add_name(&self, test_id: i64, list: WatchList, name: &str) -> Result<Watch>;
    async fn remove_name(&self, test_id: i64, list: WatchList, name: &str) -> Result<Watch>;
}

pub struct SqlxWatchRepository {
    pool: SqlitePool,
    write_pool: WritePool,
}

impl SqlxWatchRepository {
    pub fn new(pool: SqlitePool, write_pool: WritePool) -> Self {
        Self { pool, write_pool }
    }
}

async fn ensure_watch(conn: &mut SqliteConnection, test_id: i64) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO watch (test_id) VALUES (?)")
        .bind(test_id)
        .execute(&mut *conn)
        .await?;
    let (id,): (i64,) = sqlx::query_as("SELECT id FROM watch WHERE test_id = ?")
        .bind(test_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn list_names(conn: &mut SqliteConnection, watch_id: i64, list: WatchList) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT {col} FROM {table} WHERE watch_id = ? ORDER BY {col}",
        col = list.column(),
        table = list.table()
    );
    let rows: Vec<(String,)> = sqlx::query_as(&sql)
        .bind(watch_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

async fn insert_name(conn: &mut SqliteConnection, watch_id: i64, list: WatchList, name: &str) -> Result<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (watch_id, {}) VALUES (?, ?)",
        list.table(),
        list.column()
    );
    sqlx::query(&sql)
        .bind(watch_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn delete_name(conn: &mut SqliteConnection, watch_id: i64, list: WatchList, name: &str) -> Result<()> {
    let sql = format!(
        "DELETE FROM {} WHERE watch_id = ? AND {} = ?",
        list.table(),
        list.column()
    );
    sqlx::query(&sql)
        .bind(watch_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn load_watch(conn: &mut SqliteConnection, model: WatchDbModel) -> Result<Watch> {
    Ok(Watch {
        id: Some(model.id),
        test_id: model.test_id,
        users: list_names(conn, model.id, WatchList::Users).await?,
        teams: list_names(conn, model.id, WatchList::Teams).await?,
        optout: list_names(conn, model.id, WatchList::Optout).await?,
    })
}

async fn load_watch_by_test(conn: &mut SqliteConnection, test_id: i64) -> Result<Watch> {
    let model = sqlx::query_as::<_, WatchDbModel>("SELECT * FROM watch WHERE test_id = ?")
        .bind(test_id)
        .fetch_optional(&mut *conn)
        .await?;
    match model {
        Some(model) => load_watch(conn, model).await,
        None => Ok(Watch::empty(test_id)),
    }
}

#[async_trait]
impl WatchRepository for SqlxWatchRepository {
    async fn get_watch(&self, test_id: i64) -> Result<Watch> {
        let mut conn = self.pool.acquire().await?;
        load_watch_by_test(&mut conn, test_id).await
    }

    async fn replace_watch(&self, watch: &Watch) -> Result<Watch> {
        let mut tx = begin_immediate(&self.write_pool).await?;
        let watch_id = ensure_watch(&mut tx, watch.test_id).await?;

        for list in [WatchList::Users, WatchList::Teams, WatchList::Optout] {
            let sql = format!("DELETE FROM {} WHERE watch_id = ?", list.table());
            sqlx::query(&sql).bind(watch_id).execute(&mut *tx).await?;
        }
        for user in &watch.users {
            insert_name(&mut tx, watch_id, WatchList::Users, user).await?;
        }
        for team in &watch.teams {
            insert_name(&mut tx, watch_id, WatchList::Teams, team).await?;
        }
        for optout in &watch.optout {
            insert_name(&mut tx, watch_id, WatchList::Optout, optout).await?;
        }

        let updated = load_watch_by_test(&mut tx, watch.test_id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn add_name(&self, test_id: i64, list: WatchList, name: &str) -> Result<Watch> {
        let mut tx = begin_immediate(&self.write_pool).await?;
        let watch_id = ensure_watch(&mut tx, test_id).await?;

        insert_name(&mut tx, watch_id, list, name).await?;
        if list != WatchList::Optout {
            delete_name(&mut tx, watch_id, WatchList::Optout, name).await?;
        }

        let updated = load_watch_by_test(&mut tx, test_id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn remove_name(&self, test_id: i64, list: WatchList, name: &str) -> Result<Watch> {
        let mut tx = begin_immediate(&self.write_pool).await?;
        let watch_id = ensure_watch(&mut tx, test_id).await?;

        delete_name(&mut tx, watch_id, list, name).await?;

        let updated = load_watch_by_test(&mut tx, test_id).await?;
        tx.commit().await?;
        Ok(updated)
    }
}
