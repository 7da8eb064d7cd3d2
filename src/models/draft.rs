//! Draft record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::BilingualLabel;
use super::blob::{Blob, BlobResponse};
use crate::error::{AppError, AppResult};

/// Material under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Concrete,
    Asphalt,
    Soil,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concrete => "concrete",
            Self::Asphalt => "asphalt",
            Self::Soil => "soil",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "concrete" => Some(Self::Concrete),
            "asphalt" => Some(Self::Asphalt),
            "soil" => Some(Self::Soil),
            _ => None,
        }
    }

    pub fn label(&self) -> BilingualLabel {
        match self {
            Self::Concrete => BilingualLabel::new("خرسانة", "Concrete"),
            Self::Asphalt => BilingualLabel::new("أسفلت", "Asphalt"),
            Self::Soil => BilingualLabel::new("تربة", "Soil"),
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown test type '{}'", s))
    }
}

/// Review status of a draft.
///
/// `UnderReview` is the only non-terminal status. `pending` is accepted as
/// an alias on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[serde(alias = "pending")]
    UnderReview,
    Approved,
    Rejected,
}

impl DraftStatus {
    /// Status assigned to every new draft.
    pub const INITIAL: DraftStatus = DraftStatus::UnderReview;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "under_review" | "pending" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::UnderReview)
    }

    pub fn label(&self) -> BilingualLabel {
        match self {
            Self::UnderReview => BilingualLabel::new("قيد المراجعة", "Under Review"),
            Self::Approved => BilingualLabel::new("تم الاعتماد", "Approved"),
            Self::Rejected => BilingualLabel::new("مرفوض", "Rejected"),
        }
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DraftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// A lab sample submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    pub id: Uuid,
    pub sample_id: String,
    pub test_type: TestType,
    pub image: Blob,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: DraftStatus,
    pub notes: Option<String>,
    pub engineer_notes: Option<String>,
    pub excel_file: Option<Blob>,
    /// Engineer who approved or rejected the draft.
    pub reviewed_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a draft.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub sample_id: String,
    pub test_type: TestType,
    pub image: Option<Blob>,
    pub notes: Option<String>,
    pub excel_file: Option<Blob>,
    pub uploaded_by: String,
}

/// Partial update merged into an existing draft.
///
/// Has no fields for `id`, `uploaded_by` or `uploaded_at`, which never
/// change after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftChanges {
    pub sample_id: Option<String>,
    pub test_type: Option<TestType>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
    pub status: Option<DraftStatus>,
    /// `Some("")` clears the engineer notes.
    pub engineer_notes: Option<String>,
    pub excel_file: Option<Blob>,
    pub reviewed_by: Option<String>,
}

impl DraftChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the changes into `draft`, stamping `updated_at`.
    pub fn apply(self, draft: &mut DraftRecord, now: DateTime<Utc>) {
        if let Some(sample_id) = self.sample_id {
            draft.sample_id = sample_id.trim().to_string();
        }
        if let Some(test_type) = self.test_type {
            draft.test_type = test_type;
        }
        if let Some(notes) = self.notes {
            draft.notes = non_blank(notes);
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(engineer_notes) = self.engineer_notes {
            draft.engineer_notes = non_blank(engineer_notes);
        }
        if let Some(excel_file) = self.excel_file {
            draft.excel_file = Some(excel_file);
        }
        if let Some(reviewed_by) = self.reviewed_by {
            draft.reviewed_by = Some(reviewed_by);
        }
        draft.updated_at = now;
    }
}

/// Longest sample id the `drafts.sample_id` column holds, in characters.
pub const MAX_SAMPLE_ID_LEN: usize = 100;

/// Trim a sample id, rejecting blank or over-long input.
pub fn check_sample_id(sample_id: &str) -> AppResult<String> {
    let trimmed = sample_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("sample_id is required".to_string()));
    }
    if trimmed.chars().count() > MAX_SAMPLE_ID_LEN {
        return Err(AppError::Validation(format!(
            "sample_id must be at most {} characters",
            MAX_SAMPLE_ID_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim free text, mapping blank input to `None`.
pub fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_string())
    }
}

/// JSON alternative to the multipart upload, with files as data URIs.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDraftRequest {
    pub sample_id: String,
    pub test_type: TestType,
    pub notes: Option<String>,
    pub image_name: String,
    /// `data:<mime>;base64,<payload>`
    pub image: String,
    pub excel_file_name: Option<String>,
    /// `data:<mime>;base64,<payload>`
    pub excel_file: Option<String>,
}

impl CreateDraftRequest {
    /// Decode the embedded files. The uploader is filled in by the caller.
    pub fn into_new_draft(self) -> AppResult<NewDraft> {
        let image = Blob::from_data_uri(self.image_name, &self.image)?;
        let excel_file = match self.excel_file {
            Some(uri) => {
                let name = self
                    .excel_file_name
                    .unwrap_or_else(|| format!("{}.xlsx", self.sample_id.trim()));
                Some(Blob::from_data_uri(name, &uri)?)
            }
            None => None,
        };

        Ok(NewDraft {
            sample_id: self.sample_id,
            test_type: self.test_type,
            image: Some(image),
            notes: self.notes,
            excel_file,
            uploaded_by: String::new(),
        })
    }
}

/// Technician edit of a draft under review.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EditDraftRequest {
    pub sample_id: Option<String>,
    pub test_type: Option<TestType>,
    /// Empty string clears the notes.
    pub notes: Option<String>,
}

/// Engineer review decision body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub engineer_notes: Option<String>,
}

/// Engineer annotation of an approved draft.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EngineerNotesRequest {
    pub engineer_notes: String,
}

/// Draft as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct DraftResponse {
    pub id: Uuid,
    pub sample_id: String,
    pub test_type: TestType,
    pub test_type_label: BilingualLabel,
    pub image: BlobResponse,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: DraftStatus,
    pub status_label: BilingualLabel,
    pub notes: Option<String>,
    pub engineer_notes: Option<String>,
    pub excel_file: Option<BlobResponse>,
    pub reviewed_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DraftRecord> for DraftResponse {
    fn from(d: &DraftRecord) -> Self {
        Self {
            id: d.id,
            sample_id: d.sample_id.clone(),
            test_type: d.test_type,
            test_type_label: d.test_type.label(),
            image: BlobResponse::from(&d.image),
            uploaded_by: d.uploaded_by.clone(),
            uploaded_at: d.uploaded_at,
            status: d.status,
            status_label: d.status.label(),
            notes: d.notes.clone(),
            engineer_notes: d.engineer_notes.clone(),
            excel_file: d.excel_file.as_ref().map(BlobResponse::from),
            reviewed_by: d.reviewed_by.clone(),
            updated_at: d.updated_at,
        }
    }
}

/// Response for draft list endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct DraftListResponse {
    pub drafts: Vec<DraftResponse>,
    pub total: usize,
}
