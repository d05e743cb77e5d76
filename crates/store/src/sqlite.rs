//! SQLite knowledge store.
//!
//! A single `knowledge` table. Ids come from `AUTOINCREMENT`, so they keep
//! increasing and are never handed out twice, even after deletes and clears.
//! The journal is WAL with `synchronous = FULL`: a write the caller saw
//! succeed survives a crash.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kbdesk_core::error::StoreError;
use kbdesk_core::knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// The production knowledge store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// The schema is created automatically. Pass `"sqlite::memory:"` for an
    /// ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite://{path}")
        };

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        // Every connection to `:memory:` is its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite knowledge store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                question    TEXT NOT NULL,
                answer      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("knowledge table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `KnowledgeEntry` from a SQLite row.
    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeEntry, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let question: String = row
            .try_get("question")
            .map_err(|e| StoreError::QueryFailed(format!("question column: {e}")))?;
        let answer: String = row
            .try_get("answer")
            .map_err(|e| StoreError::QueryFailed(format!("answer column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at value: {e}")))?;

        Ok(KnowledgeEntry {
            id,
            question,
            answer,
            created_at,
        })
    }
}

#[async_trait]
impl KnowledgeStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, question, answer, created_at FROM knowledge ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("LIST: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn insert(&self, question: &str, answer: &str) -> Result<KnowledgeEntry, StoreError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO knowledge (question, answer, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(question)
        .bind(answer)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        let id = result.last_insert_rowid();
        debug!("Stored knowledge entry {id}");

        Ok(KnowledgeEntry {
            id,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at,
        })
    }

    async fn insert_many(&self, items: &[NewKnowledge]) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let created_at = Utc::now().to_rfc3339();
        for item in items {
            // An early return drops `tx`, which rolls the whole batch back.
            sqlx::query("INSERT INTO knowledge (question, answer, created_at) VALUES (?1, ?2, ?3)")
                .bind(&item.question)
                .bind(&item.answer)
                .bind(&created_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Storage(format!("Bulk INSERT failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!("Stored {} knowledge entries in one transaction", items.len());
        Ok(items.len())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM knowledge WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM knowledge")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("CLEAR failed: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM knowledge")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_and_list() {
        let db = test_store().await;
        let entry = db
            .insert("Erro de login", "Resetar senha no portal")
            .await
            .unwrap();
        assert!(entry.id > 0);

        let entries = db.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], entry);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let db = test_store().await;
        db.insert("first", "a").await.unwrap();
        db.insert("second", "b").await.unwrap();
        db.insert("third", "c").await.unwrap();

        let questions: Vec<String> =
            db.list().await.unwrap().into_iter().map(|e| e.question).collect();
        assert_eq!(questions, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn list_empty() {
        let db = test_store().await;
        assert!(db.list().await.unwrap().is_empty());
        assert_eq!(db.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_entry() {
        let db = test_store().await;
        let entry = db.insert("q", "a").await.unwrap();
        assert!(db.delete(entry.id).await.unwrap());
        assert_eq!(db.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_nonexistent() {
        let db = test_store().await;
        assert!(!db.delete(999).await.unwrap());
    }

    #[tokio::test]
    async fn clear_reports_removed_rows() {
        let db = test_store().await;
        db.insert("q1", "a1").await.unwrap();
        db.insert("q2", "a2").await.unwrap();
        assert_eq!(db.clear().await.unwrap(), 2);
        assert_eq!(db.count().await.unwrap(), 0);
        assert_eq!(db.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let db = test_store().await;
        let a = db.insert("q1", "a1").await.unwrap();
        let b = db.insert("q2", "a2").await.unwrap();
        db.delete(b.id).await.unwrap();
        db.clear().await.unwrap();
        let c = db.insert("q3", "a3").await.unwrap();
        assert!(c.id > b.id && b.id > a.id);
    }

    #[tokio::test]
    async fn insert_many_commits_all() {
        let db = test_store().await;
        let items = vec![
            NewKnowledge::new("q1", "a1"),
            NewKnowledge::new("q2", "a2"),
            NewKnowledge::new("q3", "a3"),
        ];
        assert_eq!(db.insert_many(&items).await.unwrap(), 3);
        assert_eq!(db.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn insert_many_empty_is_noop() {
        let db = test_store().await;
        assert_eq!(db.insert_many(&[]).await.unwrap(), 0);
        assert_eq!(db.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_many_rolls_back_on_failure() {
        let db = test_store().await;
        db.insert("existing", "kept").await.unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER reject_poison BEFORE INSERT ON knowledge
            WHEN NEW.question = 'poison'
            BEGIN
                SELECT RAISE(ABORT, 'poisoned row');
            END
            "#,
        )
        .execute(&db.pool)
        .await
        .unwrap();

        let items = vec![
            NewKnowledge::new("q1", "a1"),
            NewKnowledge::new("q2", "a2"),
            NewKnowledge::new("poison", "a3"),
        ];
        let result = db.insert_many(&items).await;
        assert!(matches!(result, Err(StoreError::Storage(_))));

        // Nothing from the failed batch is visible.
        let entries = db.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "existing");
    }

    #[tokio::test]
    async fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.db");
        let path = path.to_str().unwrap();

        {
            let db = SqliteStore::new(path).await.unwrap();
            db.insert("Erro de login", "Resetar senha").await.unwrap();
            db.pool.close().await;
        }

        let db = SqliteStore::new(path).await.unwrap();
        let entries = db.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].answer, "Resetar senha");
    }

    #[tokio::test]
    async fn store_name() {
        assert_eq!(test_store().await.name(), "sqlite");
    }
}
