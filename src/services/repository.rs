//! Persistence collaborator for draft records.
//!
//! The draft store depends only on [`DraftRepository`]. Two backings exist:
//! [`InMemoryDraftRepository`] here, and the PostgreSQL one implemented on
//! [`crate::db::DbPool`].

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::DraftRecord;

/// Abstract record store. Every call is a single atomic request: it either
/// fully succeeds or leaves the backing store unchanged.
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// All drafts, newest first by upload time.
    async fn select_all_desc(&self) -> AppResult<Vec<DraftRecord>>;

    /// Persist a new draft and return it as stored.
    async fn insert_returning(&self, draft: DraftRecord) -> AppResult<DraftRecord>;

    /// Overwrite an existing draft (matched by id) and return it as stored.
    async fn update_returning(&self, draft: DraftRecord) -> AppResult<DraftRecord>;

    /// Remove a draft. Fails with `NotFound` if it does not exist.
    async fn delete_by_id(&self, id: Uuid) -> AppResult<()>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Draft repository held in process memory.
#[derive(Default)]
pub struct InMemoryDraftRepository {
    drafts: Mutex<Vec<DraftRecord>>,
}

impl InMemoryDraftRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of drafts (any order).
    pub fn with_drafts(drafts: Vec<DraftRecord>) -> Self {
        Self {
            drafts: Mutex::new(drafts),
        }
    }
}

#[async_trait]
impl DraftRepository for InMemoryDraftRepository {
    async fn select_all_desc(&self) -> AppResult<Vec<DraftRecord>> {
        let mut drafts = self.drafts.lock().await.clone();
        // Stable sort on reversed insertion order keeps ties newest-inserted first
        drafts.reverse();
        drafts.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(drafts)
    }

    async fn insert_returning(&self, draft: DraftRecord) -> AppResult<DraftRecord> {
        let mut drafts = self.drafts.lock().await;
        if drafts.iter().any(|d| d.id == draft.id) {
            return Err(AppError::Database(format!(
                "Draft {} already exists",
                draft.id
            )));
        }
        drafts.push(draft.clone());
        Ok(draft)
    }

    async fn update_returning(&self, draft: DraftRecord) -> AppResult<DraftRecord> {
        let mut drafts = self.drafts.lock().await;
        let slot = drafts
            .iter_mut()
            .find(|d| d.id == draft.id)
            .ok_or_else(|| AppError::NotFound(format!("Draft {}", draft.id)))?;
        *slot = draft.clone();
        Ok(draft)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut drafts = self.drafts.lock().await;
        let index = drafts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Draft {}", id)))?;
        drafts.remove(index);
        Ok(())
    }
}
