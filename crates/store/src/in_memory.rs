//! In-memory store - useful for testing and throwaway sessions.

use async_trait::async_trait;
use chrono::Utc;
use kbdesk_core::error::StoreError;
use kbdesk_core::knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    entries: Vec<KnowledgeEntry>,
    next_id: i64,
}

impl Inner {
    fn push(&mut self, question: &str, answer: &str) -> KnowledgeEntry {
        self.next_id += 1;
        let entry = KnowledgeEntry {
            id: self.next_id,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }
}

/// A store that keeps entries in a Vec behind a lock.
///
/// Ids keep increasing across deletes and clears, same as the SQLite store.
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.entries.iter().rev().cloned().collect())
    }

    async fn insert(&self, question: &str, answer: &str) -> Result<KnowledgeEntry, StoreError> {
        Ok(self.inner.write().await.push(question, answer))
    }

    async fn insert_many(&self, items: &[NewKnowledge]) -> Result<usize, StoreError> {
        // One write guard for the whole batch, so readers never see half of it.
        let mut inner = self.inner.write().await;
        for item in items {
            inner.push(&item.question, &item.answer);
        }
        Ok(items.len())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let len_before = inner.entries.len();
        inner.entries.retain(|e| e.id != id);
        Ok(inner.entries.len() < len_before)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.len() as u64;
        inner.entries.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.entries.len())
    }
}
