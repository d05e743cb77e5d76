//! Knowledge entries and the store trait.
//!
//! A knowledge entry is a (question, answer) pair describing one known
//! support issue. Entries are created and deleted, never edited in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// A persisted knowledge entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Store-assigned, monotonically increasing, never reused.
    pub id: i64,

    /// The documented problem ("Qual o seu erro?" column in the admin sheets).
    pub question: String,

    /// The canonical answer, reproduced verbatim by the assistant.
    pub answer: String,

    /// Set by the store at insertion.
    pub created_at: DateTime<Utc>,
}

/// An insert candidate: a question/answer pair without identity.
///
/// Fields default to empty so that partially filled bulk items deserialize
/// and are then skipped by validation instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKnowledge {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub answer: String,
}

impl NewKnowledge {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Trimmed copy, or `None` if either field is blank.
    pub fn normalized(&self) -> Option<NewKnowledge> {
        let question = self.question.trim();
        let answer = self.answer.trim();
        if question.is_empty() || answer.is_empty() {
            None
        } else {
            Some(NewKnowledge::new(question, answer))
        }
    }
}

/// Anything that carries question/answer text.
///
/// The prompt context only needs the text, so it accepts either persisted
/// entries or a client-supplied snapshot of bare pairs.
pub trait KnowledgeRecord {
    fn question(&self) -> &str;
    fn answer(&self) -> &str;
}

impl KnowledgeRecord for KnowledgeEntry {
    fn question(&self) -> &str {
        &self.question
    }

    fn answer(&self) -> &str {
        &self.answer
    }
}

impl KnowledgeRecord for NewKnowledge {
    fn question(&self) -> &str {
        &self.question
    }

    fn answer(&self) -> &str {
        &self.answer
    }
}

/// Persistence for knowledge entries.
///
/// Implementations do no validation and no authorization: that is the job
/// of the service layer sitting in front of the store.
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// All entries, newest first.
    async fn list(&self) -> std::result::Result<Vec<KnowledgeEntry>, StoreError>;

    /// Insert one entry and return it with its assigned id and timestamp.
    async fn insert(
        &self,
        question: &str,
        answer: &str,
    ) -> std::result::Result<KnowledgeEntry, StoreError>;

    /// Insert every item in a single all-or-nothing unit. Returns rows inserted.
    async fn insert_many(&self, items: &[NewKnowledge]) -> std::result::Result<usize, StoreError>;

    /// Delete by id. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> std::result::Result<bool, StoreError>;

    /// Remove every entry. Returns rows removed.
    async fn clear(&self) -> std::result::Result<u64, StoreError>;

    /// Total entry count.
    async fn count(&self) -> std::result::Result<usize, StoreError>;
}
