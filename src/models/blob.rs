//! Embedded file attachments (sample images and spreadsheets).
//!
//! Attachments travel between the UI and the server as `data:` URIs and are
//! stored as raw bytes. The server never writes them to disk.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Content type used when a data URI or upload does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Longest attachment name the `*_name` columns hold, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Longest content type the `*_content_type` columns hold.
pub const MAX_CONTENT_TYPE_LEN: usize = 100;

/// Opaque attachment bytes with their display metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a blob, rejecting empty payloads, blank names and metadata
    /// longer than the database columns.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation("Attachment name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Attachment name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        if data.is_empty() {
            return Err(AppError::Validation(format!("Attachment '{}' is empty", name)));
        }

        let content_type = content_type.into();
        let content_type = if content_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            content_type
        };
        if content_type.chars().count() > MAX_CONTENT_TYPE_LEN {
            return Err(AppError::Validation(format!(
                "Attachment content type must be at most {} characters",
                MAX_CONTENT_TYPE_LEN
            )));
        }

        Ok(Self {
            name,
            content_type,
            data,
        })
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(name: impl Into<String>, uri: &str) -> AppResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AppError::Validation("Attachment must be a data URI".to_string()))?;

        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::Validation("Malformed data URI".to_string()))?;

        let content_type = meta.strip_suffix(";base64").ok_or_else(|| {
            AppError::Validation("Only base64 data URIs are supported".to_string())
        })?;

        let data = STANDARD.decode(payload.trim())?;
        Self::new(name, content_type, data)
    }

    /// Encode as a `data:` URI suitable for embedding in HTML.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.data)
        )
    }

    /// Raster image types that are safe to render inline. SVG can carry script.
    pub fn is_raster_image(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        content_type.starts_with("image/") && !content_type.starts_with("image/svg")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

/// Attachment as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BlobResponse {
    pub name: String,
    pub content_type: String,
    pub size_bytes: usize,
    /// Inline `data:` URI with the full content.
    pub data_uri: String,
}

impl From<&Blob> for BlobResponse {
    fn from(blob: &Blob) -> Self {
        Self {
            name: blob.name.clone(),
            content_type: blob.content_type.clone(),
            size_bytes: blob.len(),
            data_uri: blob.to_data_uri(),
        }
    }
}
