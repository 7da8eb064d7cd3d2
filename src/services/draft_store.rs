//! Record store for draft submissions.
//!
//! Keeps the ordered draft collection in memory, newest first, and writes
//! every mutation through the [`DraftRepository`] collaborator before touching
//! the local copy. A failed collaborator call leaves local state unchanged.
//!
//! The store does not check roles or statuses; that is the job of
//! [`crate::services::lifecycle`].

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::draft::{check_sample_id, non_blank};
use crate::models::user::MAX_USER_NAME_LEN;
use crate::models::{DraftChanges, DraftRecord, DraftStatus, NewDraft, WsEvent, WsEventMessage};
use crate::services::EventBroadcaster;
use crate::services::repository::DraftRepository;

pub struct DraftStore {
    repository: Arc<dyn DraftRepository>,
    drafts: RwLock<Vec<DraftRecord>>,
    events: Option<EventBroadcaster>,
}

impl DraftStore {
    /// Create a store with an empty collection.
    ///
    /// Use [`DraftStore::load`] when the repository may already hold drafts.
    pub fn empty(repository: Arc<dyn DraftRepository>) -> Self {
        Self {
            repository,
            drafts: RwLock::new(Vec::new()),
            events: None,
        }
    }

    /// Create a store initialized from the repository contents.
    pub async fn load(repository: Arc<dyn DraftRepository>) -> AppResult<Self> {
        let drafts = repository.select_all_desc().await?;
        info!("Loaded {} drafts from repository", drafts.len());

        Ok(Self {
            repository,
            drafts: RwLock::new(drafts),
            events: None,
        })
    }

    /// Broadcast an event after every successful mutation.
    pub fn with_events(mut self, broadcaster: EventBroadcaster) -> Self {
        self.events = Some(broadcaster);
        self
    }

    /// Check that the backing repository is reachable.
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    /// Create a draft in the initial status.
    ///
    /// Requires a non-blank sample id and a non-empty image. Text fields must
    /// fit the column widths of the `drafts` table.
    pub async fn create(&self, input: NewDraft) -> AppResult<DraftRecord> {
        let sample_id = check_sample_id(&input.sample_id)?;
        if input.uploaded_by.chars().count() > MAX_USER_NAME_LEN {
            return Err(AppError::Validation(format!(
                "uploader name must be at most {} characters",
                MAX_USER_NAME_LEN
            )));
        }
        let image = match input.image {
            Some(image) if !image.is_empty() => image,
            _ => return Err(AppError::Validation("image is required".to_string())),
        };

        let now = Utc::now();
        let draft = DraftRecord {
            id: Uuid::now_v7(),
            sample_id,
            test_type: input.test_type,
            image,
            uploaded_by: input.uploaded_by,
            uploaded_at: now,
            status: DraftStatus::INITIAL,
            notes: input.notes.and_then(non_blank),
            engineer_notes: None,
            excel_file: input.excel_file,
            reviewed_by: None,
            updated_at: now,
        };

        let mut drafts = self.drafts.write().await;
        let stored = self.repository.insert_returning(draft).await?;
        drafts.insert(0, stored.clone());
        drop(drafts);

        info!(
            "Draft created: id={}, sample_id={}, test_type={}, uploaded_by={}",
            stored.id, stored.sample_id, stored.test_type, stored.uploaded_by
        );
        self.emit(WsEvent::draft_created(&stored));

        Ok(stored)
    }

    /// Merge `changes` into the draft with the given id.
    pub async fn update(&self, id: Uuid, changes: DraftChanges) -> AppResult<DraftRecord> {
        self.update_with(id, |_| Ok(changes)).await
    }

    /// Derive changes from the current record and merge them, all under the
    /// write lock. An error from `rule` leaves the draft untouched.
    pub async fn update_with<F>(&self, id: Uuid, rule: F) -> AppResult<DraftRecord>
    where
        F: FnOnce(&DraftRecord) -> AppResult<DraftChanges>,
    {
        let mut drafts = self.drafts.write().await;
        let index = drafts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Draft {}", id)))?;

        let changes = rule(&drafts[index])?;
        let mut updated = drafts[index].clone();
        changes.apply(&mut updated, Utc::now());

        let stored = self.repository.update_returning(updated).await?;
        drafts[index] = stored.clone();
        drop(drafts);

        info!("Draft updated: id={}, status={}", stored.id, stored.status);
        self.emit(WsEvent::draft_updated(&stored));

        Ok(stored)
    }

    /// Remove the draft. Deleting an id that is already gone fails.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut drafts = self.drafts.write().await;
        let index = drafts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Draft {}", id)))?;

        self.repository.delete_by_id(id).await?;
        drafts.remove(index);
        drop(drafts);

        info!("Draft deleted: id={}", id);
        self.emit(WsEvent::draft_deleted(id));

        Ok(())
    }

    /// All drafts, newest first.
    pub async fn list(&self) -> Vec<DraftRecord> {
        self.drafts.read().await.clone()
    }

    /// Look up a single draft.
    pub async fn get(&self, id: Uuid) -> AppResult<DraftRecord> {
        self.drafts
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Draft {}", id)))
    }

    fn emit(&self, event: WsEvent) {
        if let Some(ref broadcaster) = self.events {
            broadcaster.send(WsEventMessage::new(event));
        }
    }
}
