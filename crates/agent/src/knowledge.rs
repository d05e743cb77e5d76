//! The knowledge service: the store contract every surface goes through.
//!
//! Order of checks on every mutation: authorization, then validation,
//! then storage. A rejected request never reaches the store.

use kbdesk_core::auth::{AuthPolicy, Credential};
use kbdesk_core::error::{Error, Result};
use kbdesk_core::knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct KnowledgeService {
    store: Arc<dyn KnowledgeStore>,
    policy: Arc<dyn AuthPolicy>,
}

impl KnowledgeService {
    pub fn new(store: Arc<dyn KnowledgeStore>, policy: Arc<dyn AuthPolicy>) -> Self {
        Self { store, policy }
    }

    fn authorize(&self, credential: Credential<'_>, action: &str) -> Result<()> {
        if self.policy.allows(credential) {
            Ok(())
        } else {
            warn!(action, policy = self.policy.name(), "Rejected knowledge mutation");
            Err(Error::Unauthorized)
        }
    }

    /// All entries, newest first. No credential needed.
    pub async fn list(&self) -> Result<Vec<KnowledgeEntry>> {
        Ok(self.store.list().await?)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.count().await?)
    }

    /// Store one entry. The stored text is the trimmed text.
    pub async fn create(
        &self,
        credential: Credential<'_>,
        question: &str,
        answer: &str,
    ) -> Result<KnowledgeEntry> {
        self.authorize(credential, "create")?;

        let item = NewKnowledge::new(question, answer)
            .normalized()
            .ok_or_else(|| Error::Validation("question and answer are required".into()))?;

        let entry = self.store.insert(&item.question, &item.answer).await?;
        info!(id = entry.id, "Created knowledge entry");
        Ok(entry)
    }

    /// Store every valid item in one transaction. Items with a blank
    /// question or answer are skipped. Returns how many rows were inserted.
    pub async fn bulk_create(
        &self,
        credential: Credential<'_>,
        items: &[NewKnowledge],
    ) -> Result<usize> {
        self.authorize(credential, "bulk_create")?;

        let valid: Vec<NewKnowledge> = items.iter().filter_map(NewKnowledge::normalized).collect();
        let skipped = items.len() - valid.len();
        if skipped > 0 {
            debug!(skipped, "Skipping bulk items with a blank question or answer");
        }
        if valid.is_empty() {
            return Ok(0);
        }

        let inserted = self.store.insert_many(&valid).await?;
        info!(inserted, skipped, "Bulk created knowledge entries");
        Ok(inserted)
    }

    /// Delete an entry. Deleting an id that does not exist succeeds.
    pub async fn delete_by_id(&self, credential: Credential<'_>, id: i64) -> Result<()> {
        self.authorize(credential, "delete")?;

        let removed = self.store.delete(id).await?;
        if removed {
            info!(id, "Deleted knowledge entry");
        } else {
            debug!(id, "Delete of unknown knowledge entry");
        }
        Ok(())
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn clear_all(&self, credential: Credential<'_>) -> Result<u64> {
        self.authorize(credential, "clear")?;

        let removed = self.store.clear().await?;
        info!(removed, "Cleared knowledge base");
        Ok(removed)
    }
}
