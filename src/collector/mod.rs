//! Usage aggregation over the Open WebUI store.
//!
//! [`UsageCollector::collect`] performs one full synchronous scan of the
//! database and produces an immutable [`UsageSnapshot`]. Collection is
//! deliberately infallible: a row that cannot be read is logged and skipped,
//! and a scan that cannot run at all (store unreachable) yields the zeroed
//! snapshot. A periodic exporter must keep reporting "no data" rather than
//! crash.

pub mod cache;

use futures::StreamExt;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{instrument, warn};

use crate::chat;
use crate::db::ChatRow;

/// Trailing activity window for `users_active_30d` (30 days)
pub const ACTIVE_WINDOW_SECS: i64 = 2_592_000;

/// Display name used when a user row has no name or a chat has no known owner
pub const UNKNOWN_USER: &str = "Unknown";

/// One immutable aggregation result, built wholesale by a single scan.
///
/// `messages_total` always equals the sum of `messages_by_user` values. The
/// per-model map does NOT share that property: a chat naming several models
/// attributes its full assistant-message count to each of them. That
/// double-count is deliberate and matches what the dashboard has always
/// shown; "responses involving model X" is the intended reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub users_total: u64,
    pub users_active_30d: u64,
    pub chats_total: u64,
    pub messages_total: u64,
    pub messages_by_model: HashMap<String, u64>,
    pub messages_by_user: HashMap<String, u64>,
}

/// Scans the Open WebUI database and derives usage statistics.
#[derive(Clone)]
pub struct UsageCollector {
    pool: SqlitePool,
}

impl UsageCollector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run one full aggregation pass. Never fails; degraded results are
    /// logged and the caller gets whatever could be collected (possibly the
    /// zeroed snapshot).
    #[instrument(skip_all)]
    pub async fn collect(&self) -> UsageSnapshot {
        match self.collect_inner().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Usage scan failed, reporting empty snapshot");
                UsageSnapshot::default()
            }
        }
    }

    async fn collect_inner(&self) -> Result<UsageSnapshot, sqlx::Error> {
        let cutoff = chrono::Utc::now().timestamp() - ACTIVE_WINDOW_SECS;

        // User metrics (single aggregate query)
        let (users_total, users_active): (i64, Option<i64>) =
            sqlx::query_as("SELECT COUNT(*), SUM(CASE WHEN last_active_at > ? THEN 1 ELSE 0 END) FROM user")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;

        let chats_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat").fetch_one(&self.pool).await?;

        // User names lookup, NULL names fall back to "Unknown"
        let names: Vec<(String, Option<String>)> = sqlx::query_as("SELECT id, name FROM user").fetch_all(&self.pool).await?;
        let display_names: HashMap<String, String> = names
            .into_iter()
            .map(|(id, name)| (id, name.unwrap_or_else(|| UNKNOWN_USER.to_string())))
            .collect();

        let mut snapshot = UsageSnapshot {
            users_total: users_total.max(0) as u64,
            users_active_30d: users_active.unwrap_or(0).max(0) as u64,
            chats_total: chats_total.max(0) as u64,
            ..Default::default()
        };

        // Stream every chat record; a bad row is skipped, not fatal
        let mut rows = sqlx::query_as::<_, ChatRow>("SELECT user_id, chat FROM chat").fetch(&self.pool);
        while let Some(row) = rows.next().await {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "Skipping corrupt chat row");
                    continue;
                }
            };

            let stats = chat::parse_chat_blob(row.chat.as_deref());
            snapshot.messages_total += stats.assistant_messages;

            let owner = row
                .user_id
                .as_deref()
                .and_then(|id| display_names.get(id))
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USER.to_string());
            *snapshot.messages_by_user.entry(owner).or_insert(0) += stats.assistant_messages;

            for model in stats.models {
                *snapshot.messages_by_model.entry(model).or_insert(0) += stats.assistant_messages;
            }
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // One connection so the in-memory database is shared across queries
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should connect");
        sqlx::query("CREATE TABLE user (id TEXT PRIMARY KEY, name TEXT, last_active_at INTEGER)")
            .execute(&pool)
            .await
            .expect("create user table");
        sqlx::query("CREATE TABLE chat (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id TEXT, chat TEXT)")
            .execute(&pool)
            .await
            .expect("create chat table");
        pool
    }

    async fn insert_user(pool: &SqlitePool, id: &str, name: Option<&str>, last_active_at: i64) {
        sqlx::query("INSERT INTO user (id, name, last_active_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(last_active_at)
            .execute(pool)
            .await
            .expect("insert user");
    }

    async fn insert_chat(pool: &SqlitePool, user_id: Option<&str>, chat: Option<&str>) {
        sqlx::query("INSERT INTO chat (user_id, chat) VALUES (?, ?)")
            .bind(user_id)
            .bind(chat)
            .execute(pool)
            .await
            .expect("insert chat");
    }

    #[tokio::test]
    async fn empty_store_yields_zeroed_snapshot() {
        let collector = UsageCollector::new(test_pool().await);
        assert_eq!(collector.collect().await, UsageSnapshot::default());
    }

    #[tokio::test]
    async fn end_to_end_single_chat() {
        let pool = test_pool().await;
        let now = chrono::Utc::now().timestamp();
        insert_user(&pool, "u1", Some("Alice"), now).await;
        insert_user(&pool, "u2", Some("Bob"), now - 90 * 24 * 3600).await;
        insert_chat(
            &pool,
            Some("u1"),
            Some(r#"{"messages": [{"role": "user"}, {"role": "assistant"}, {"role": "assistant"}], "models": ["gpt-x"]}"#),
        )
        .await;

        let snapshot = UsageCollector::new(pool).collect().await;
        assert_eq!(snapshot.users_total, 2);
        assert_eq!(snapshot.users_active_30d, 1);
        assert_eq!(snapshot.chats_total, 1);
        assert_eq!(snapshot.messages_total, 2);
        assert_eq!(snapshot.messages_by_model, HashMap::from([("gpt-x".to_string(), 2)]));
        assert_eq!(snapshot.messages_by_user, HashMap::from([("Alice".to_string(), 2)]));
    }

    #[tokio::test]
    async fn chat_with_two_models_counts_fully_for_each() {
        let pool = test_pool().await;
        insert_user(&pool, "u1", Some("Alice"), 0).await;
        insert_chat(
            &pool,
            Some("u1"),
            Some(
                r#"{"messages": [{"role": "assistant"}, {"role": "assistant"}, {"role": "assistant"}],
                    "models": ["gpt-x", "llama-3"]}"#,
            ),
        )
        .await;

        let snapshot = UsageCollector::new(pool).collect().await;
        assert_eq!(snapshot.messages_total, 3);
        // Full count per model, not split between them
        assert_eq!(snapshot.messages_by_model.get("gpt-x"), Some(&3));
        assert_eq!(snapshot.messages_by_model.get("llama-3"), Some(&3));
    }

    #[tokio::test]
    async fn messages_total_matches_per_user_sum() {
        let pool = test_pool().await;
        insert_user(&pool, "u1", Some("Alice"), 0).await;
        insert_user(&pool, "u2", Some("Bob"), 0).await;
        insert_chat(&pool, Some("u1"), Some(r#"{"messages": [{"role": "assistant"}]}"#)).await;
        insert_chat(&pool, Some("u1"), Some(r#"{"messages": [{"role": "assistant"}, {"role": "assistant"}]}"#)).await;
        insert_chat(&pool, Some("u2"), Some(r#"{"messages": [{"role": "assistant"}]}"#)).await;

        let snapshot = UsageCollector::new(pool).collect().await;
        assert_eq!(snapshot.messages_total, 4);
        assert_eq!(snapshot.messages_by_user.values().sum::<u64>(), snapshot.messages_total);
        assert_eq!(snapshot.messages_by_user.get("Alice"), Some(&3));
        assert_eq!(snapshot.messages_by_user.get("Bob"), Some(&1));
    }

    #[tokio::test]
    async fn corrupt_blob_does_not_abort_aggregation() {
        let pool = test_pool().await;
        insert_user(&pool, "u1", Some("Alice"), 0).await;
        insert_chat(&pool, Some("u1"), Some("{definitely not json")).await;
        insert_chat(&pool, Some("u1"), Some(r#"{"messages": [{"role": "assistant"}]}"#)).await;

        let snapshot = UsageCollector::new(pool).collect().await;
        assert_eq!(snapshot.chats_total, 2);
        assert_eq!(snapshot.messages_total, 1);
        assert_eq!(snapshot.messages_by_user.get("Alice"), Some(&1));
    }

    #[tokio::test]
    async fn unknown_owner_and_nameless_user_fall_back() {
        let pool = test_pool().await;
        insert_user(&pool, "u1", None, 0).await;
        insert_chat(&pool, Some("u1"), Some(r#"{"messages": [{"role": "assistant"}]}"#)).await;
        insert_chat(&pool, Some("ghost"), Some(r#"{"messages": [{"role": "assistant"}]}"#)).await;
        insert_chat(&pool, None, Some(r#"{"messages": [{"role": "assistant"}]}"#)).await;

        let snapshot = UsageCollector::new(pool).collect().await;
        // u1 has a NULL name, the other two owners are unresolvable; all
        // three land in the "Unknown" bucket
        assert_eq!(snapshot.messages_by_user.get(UNKNOWN_USER), Some(&3));
        assert_eq!(snapshot.messages_total, 3);
    }

    #[tokio::test]
    async fn unreachable_store_yields_zeroed_snapshot() {
        let pool = test_pool().await;
        let collector = UsageCollector::new(pool.clone());
        pool.close().await;
        assert_eq!(collector.collect().await, UsageSnapshot::default());
    }
}
