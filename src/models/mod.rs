//! Domain models for the lab drafts server.

use serde::Serialize;
use utoipa::ToSchema;

pub mod blob;
pub mod draft;
pub mod user;
pub mod ws_event;

// Re-export commonly used types
pub use blob::{Blob, BlobResponse};
pub use draft::{
    CreateDraftRequest, DraftChanges, DraftListResponse, DraftRecord, DraftResponse, DraftStatus,
    EditDraftRequest, EngineerNotesRequest, NewDraft, ReviewRequest, TestType,
};
pub use user::{LoginRequest, LoginResponse, User, UserAccount, UserResponse, UserRole};
pub use ws_event::{WsEvent, WsEventMessage};

/// Arabic/English pair shown side by side in the UI and printed reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BilingualLabel {
    #[schema(value_type = String)]
    pub arabic: &'static str,
    #[schema(value_type = String)]
    pub english: &'static str,
}

impl BilingualLabel {
    pub const fn new(arabic: &'static str, english: &'static str) -> Self {
        Self { arabic, english }
    }
}

impl std::fmt::Display for BilingualLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.arabic, self.english)
    }
}
