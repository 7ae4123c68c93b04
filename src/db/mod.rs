//! Read-only access to Open WebUI's SQLite database.
//!
//! The exporter only ever reads: a user aggregate, a chat count, the user
//! name lookup, and a full scan of chat rows. The pool is opened read-only
//! so a misbehaving query can never touch the application's data.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long to wait between existence checks while the database file is
/// missing at startup.
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A `(user_id, chat)` pair from the `chat` table. Both columns are nullable
/// in practice; the aggregation layer treats missing values as unknown.
#[derive(Debug, sqlx::FromRow)]
pub struct ChatRow {
    pub user_id: Option<String>,
    pub chat: Option<String>,
}

/// Open a read-only connection pool against the Open WebUI database file.
pub async fn connect(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new().filename(db_path).read_only(true);

    SqlitePoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// Block until the database file exists.
///
/// Open WebUI creates its database on first startup, which may happen after
/// the exporter container comes up. Polling here keeps the deployment
/// ordering-insensitive.
pub async fn wait_for_database(db_path: &Path) {
    while !db_path.exists() {
        info!(path = %db_path.display(), "Waiting for database...");
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_read_only_to_an_existing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("webui.db");

        // Seed a database file; the exporter itself never writes
        let seed = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(&path).create_if_missing(true))
            .await
            .expect("seed pool connects");
        sqlx::query("CREATE TABLE user (id TEXT PRIMARY KEY)")
            .execute(&seed)
            .await
            .expect("create table");
        seed.close().await;

        let pool = connect(&path).await.expect("read-only connect succeeds");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
            .fetch_one(&pool)
            .await
            .expect("query runs");
        assert_eq!(count, 0);
        assert!(
            sqlx::query("INSERT INTO user (id) VALUES ('u1')").execute(&pool).await.is_err(),
            "writes must be rejected on the read-only pool"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_the_database_file_appears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("webui.db");

        let waiter = tokio::spawn({
            let path = path.clone();
            async move { wait_for_database(&path).await }
        });

        tokio::time::advance(WAIT_POLL_INTERVAL).await;
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        std::fs::write(&path, b"").expect("create database file");
        tokio::time::advance(WAIT_POLL_INTERVAL).await;
        waiter.await.expect("waiter finishes once the file exists");
    }
}
