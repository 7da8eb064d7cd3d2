//! Draft workflow: lifecycle checks composed with store mutations.
//!
//! Each operation runs the matching rule from [`lifecycle`] against the
//! current record while the store holds its write lock, so a concurrent
//! review cannot slip in between the check and the write. A rejected
//! attempt is logged and never reaches the repository.

use tracing::warn;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{DraftRecord, EditDraftRequest, NewDraft, User};
use crate::services::draft_store::DraftStore;
use crate::services::lifecycle;

fn log_rejected<T>(
    result: AppResult<T>,
    actor: &User,
    action: &str,
    id: Option<Uuid>,
) -> AppResult<T> {
    if let Err(ref e) = result {
        match id {
            Some(id) => warn!(
                "Rejected {} by {} ({}) on draft {}: {}",
                action, actor.name, actor.role, id, e
            ),
            None => warn!("Rejected {} by {} ({}): {}", action, actor.name, actor.role, e),
        }
    }
    result
}

/// Upload a new draft on behalf of `actor`.
pub async fn submit(
    store: &DraftStore,
    actor: &User,
    mut input: NewDraft,
) -> AppResult<DraftRecord> {
    log_rejected(lifecycle::authorize_create(actor), actor, "upload", None)?;
    input.uploaded_by = actor.name.clone();
    store.create(input).await
}

/// Edit technician-owned fields of a draft under review.
pub async fn edit(
    store: &DraftStore,
    actor: &User,
    id: Uuid,
    request: EditDraftRequest,
) -> AppResult<DraftRecord> {
    store
        .update_with(id, |record| {
            log_rejected(lifecycle::edit(actor, record, request), actor, "edit", Some(id))
        })
        .await
}

pub async fn approve(
    store: &DraftStore,
    actor: &User,
    id: Uuid,
    engineer_notes: Option<String>,
) -> AppResult<DraftRecord> {
    store
        .update_with(id, |record| {
            log_rejected(
                lifecycle::approve(actor, record, engineer_notes),
                actor,
                "approve",
                Some(id),
            )
        })
        .await
}

pub async fn reject(
    store: &DraftStore,
    actor: &User,
    id: Uuid,
    engineer_notes: Option<String>,
) -> AppResult<DraftRecord> {
    store
        .update_with(id, |record| {
            log_rejected(
                lifecycle::reject(actor, record, engineer_notes),
                actor,
                "reject",
                Some(id),
            )
        })
        .await
}

pub async fn annotate(
    store: &DraftStore,
    actor: &User,
    id: Uuid,
    engineer_notes: String,
) -> AppResult<DraftRecord> {
    store
        .update_with(id, |record| {
            log_rejected(
                lifecycle::annotate(actor, record, engineer_notes),
                actor,
                "annotate",
                Some(id),
            )
        })
        .await
}

/// Delete a draft in any status. Engineers only.
pub async fn remove(store: &DraftStore, actor: &User, id: Uuid) -> AppResult<()> {
    log_rejected(lifecycle::authorize_delete(actor), actor, "delete", Some(id))?;
    store.delete(id).await
}
