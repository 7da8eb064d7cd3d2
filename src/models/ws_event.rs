//! WebSocket event types for real-time dashboard updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DraftRecord, DraftStatus, TestType};

/// WebSocket event sent to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum WsEvent {
    /// A technician uploaded a new draft.
    DraftCreated(DraftChangedPayload),
    /// A draft was edited, approved, rejected or annotated.
    DraftUpdated(DraftChangedPayload),
    /// An engineer deleted a draft.
    DraftDeleted(DraftDeletedPayload),
}

/// Payload for draft_created and draft_updated events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftChangedPayload {
    pub draft_id: Uuid,
    pub sample_id: String,
    pub test_type: TestType,
    pub status: DraftStatus,
    pub uploaded_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Payload for draft_deleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftDeletedPayload {
    pub draft_id: Uuid,
}

/// Wrapper that includes timestamp with every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEventMessage {
    #[serde(flatten)]
    pub event: WsEvent,
    pub timestamp: DateTime<Utc>,
}

impl WsEventMessage {
    /// Create a new event message with the current timestamp.
    pub fn new(event: WsEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

impl DraftChangedPayload {
    fn from_draft(draft: &DraftRecord) -> Self {
        Self {
            draft_id: draft.id,
            sample_id: draft.sample_id.clone(),
            test_type: draft.test_type,
            status: draft.status,
            uploaded_by: draft.uploaded_by.clone(),
            updated_at: draft.updated_at,
        }
    }
}

impl WsEvent {
    pub fn draft_created(draft: &DraftRecord) -> Self {
        WsEvent::DraftCreated(DraftChangedPayload::from_draft(draft))
    }

    pub fn draft_updated(draft: &DraftRecord) -> Self {
        WsEvent::DraftUpdated(DraftChangedPayload::from_draft(draft))
    }

    pub fn draft_deleted(draft_id: Uuid) -> Self {
        WsEvent::DraftDeleted(DraftDeletedPayload { draft_id })
    }
}
