//! Draft status lifecycle and role authorization.
//!
//! ```text
//! under_review ──approve──▶ approved   (terminal, annotatable)
//!      │
//!      └───────reject────▶ rejected   (terminal)
//! ```
//!
//! Every rule here is a pure check over the acting user and the current
//! record. On success it yields the [`DraftChanges`] to hand to the store;
//! on failure nothing has been touched.

use crate::error::{AppError, AppResult};
use crate::models::draft::check_sample_id;
use crate::models::{DraftChanges, DraftRecord, DraftStatus, EditDraftRequest, User, UserRole};

fn require_engineer(actor: &User, action: &str) -> AppResult<()> {
    if actor.is_engineer() {
        Ok(())
    } else {
        Err(AppError::Permission(format!(
            "only engineers may {} drafts",
            action
        )))
    }
}

fn require_under_review(record: &DraftRecord) -> AppResult<()> {
    if record.status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "draft {} is already {}",
            record.id, record.status
        )));
    }
    Ok(())
}

/// Technicians upload drafts; engineers only review them.
pub fn authorize_create(actor: &User) -> AppResult<()> {
    match actor.role {
        UserRole::Technician => Ok(()),
        UserRole::Engineer => Err(AppError::Permission(
            "only technicians may upload drafts".to_string(),
        )),
    }
}

/// Delete is allowed from any status, engineers only.
pub fn authorize_delete(actor: &User) -> AppResult<()> {
    require_engineer(actor, "delete")
}

/// Approve a draft under review.
pub fn approve(
    actor: &User,
    record: &DraftRecord,
    engineer_notes: Option<String>,
) -> AppResult<DraftChanges> {
    require_engineer(actor, "approve")?;
    require_under_review(record)?;

    Ok(DraftChanges {
        status: Some(DraftStatus::Approved),
        engineer_notes: Some(engineer_notes.unwrap_or_default()),
        reviewed_by: Some(actor.name.clone()),
        ..Default::default()
    })
}

/// Reject a draft under review.
pub fn reject(
    actor: &User,
    record: &DraftRecord,
    engineer_notes: Option<String>,
) -> AppResult<DraftChanges> {
    require_engineer(actor, "reject")?;
    require_under_review(record)?;

    Ok(DraftChanges {
        status: Some(DraftStatus::Rejected),
        engineer_notes,
        reviewed_by: Some(actor.name.clone()),
        ..Default::default()
    })
}

/// Edit technician-owned fields. Only drafts still under review can change.
pub fn edit(
    _actor: &User,
    record: &DraftRecord,
    request: EditDraftRequest,
) -> AppResult<DraftChanges> {
    if record.status != DraftStatus::UnderReview {
        return Err(AppError::InvalidState(format!(
            "draft {} is {} and can no longer be edited",
            record.id, record.status
        )));
    }

    let sample_id = request.sample_id.as_deref().map(check_sample_id).transpose()?;

    let changes = DraftChanges {
        sample_id,
        test_type: request.test_type,
        notes: request.notes,
        ..Default::default()
    };
    if changes.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    Ok(changes)
}

/// Replace the engineer notes on an approved draft.
pub fn annotate(
    actor: &User,
    record: &DraftRecord,
    engineer_notes: String,
) -> AppResult<DraftChanges> {
    require_engineer(actor, "annotate")?;
    if record.status != DraftStatus::Approved {
        return Err(AppError::InvalidState(format!(
            "draft {} is {}; only approved drafts can be annotated",
            record.id, record.status
        )));
    }

    Ok(DraftChanges {
        engineer_notes: Some(engineer_notes),
        ..Default::default()
    })
}
