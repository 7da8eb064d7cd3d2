//! Draft endpoints: upload, review, archive and print.
//!
//! Every route requires a session. Role and status rules live in
//! [`crate::services::lifecycle`]; handlers only translate HTTP to workflow
//! calls and back.

use actix_multipart::{Field, Multipart};
use actix_web::guard::GuardContext;
use actix_web::http::header;
use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use futures_util::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::config::MaxUploadSize;
use crate::error::{AppError, AppResult};
use crate::models::{
    Blob, CreateDraftRequest, DraftListResponse, DraftRecord, DraftResponse,
    EditDraftRequest, EngineerNotesRequest, NewDraft, ReviewRequest, TestType,
};
use crate::services::{
    DraftStats, DraftStore, FilterCriteria, filter, lifecycle, print_report, workflow,
};

fn parse_draft_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid draft ID '{}'", raw)))
}

fn list_response(drafts: Vec<&DraftRecord>) -> DraftListResponse {
    DraftListResponse {
        total: drafts.len(),
        drafts: drafts.into_iter().map(DraftResponse::from).collect(),
    }
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(disposition: &str, filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition,
        fallback,
        urlencoding::encode(filename)
    )
}

fn blob_response(blob: &Blob, disposition: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(blob.content_type.clone())
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            content_disposition(disposition, &blob.name),
        ))
        .body(blob.data.clone())
}

// ============================================================================
// Collection
// ============================================================================

/// List drafts, newest first, narrowed by the given criteria.
#[utoipa::path(
    get,
    path = "/api/v1/drafts",
    tag = "Drafts",
    params(
        ("sample_id" = Option<String>, Query, description = "Case-insensitive substring of the sample ID"),
        ("date" = Option<String>, Query, description = "Upload day in server local time (YYYY-MM-DD)"),
        ("test_type" = Option<String>, Query, description = "concrete, asphalt, soil or all"),
        ("status" = Option<String>, Query, description = "under_review (or pending), approved, rejected or all"),
        ("notes" = Option<String>, Query, description = "Case-insensitive substring of technician notes"),
        ("uploaded_by" = Option<String>, Query, description = "Case-insensitive substring of the uploader name"),
        ("search" = Option<String>, Query, description = "Matches sample ID, uploader or notes")
    ),
    responses(
        (status = 200, description = "Matching drafts", body = DraftListResponse),
        (status = 400, description = "Invalid criteria"),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts")]
pub async fn list_drafts(
    _auth: SessionAuth,
    query: web::Query<FilterCriteria>,
    store: web::Data<DraftStore>,
) -> HttpResponse {
    let drafts = store.list().await;
    HttpResponse::Ok().json(list_response(filter::filter(&drafts, &query)))
}

/// List approved drafts, narrowed by the given criteria.
#[utoipa::path(
    get,
    path = "/api/v1/drafts/archive",
    tag = "Drafts",
    params(
        ("sample_id" = Option<String>, Query, description = "Case-insensitive substring of the sample ID"),
        ("date" = Option<String>, Query, description = "Upload day in server local time (YYYY-MM-DD)"),
        ("test_type" = Option<String>, Query, description = "concrete, asphalt, soil or all"),
        ("notes" = Option<String>, Query, description = "Case-insensitive substring of technician notes"),
        ("uploaded_by" = Option<String>, Query, description = "Case-insensitive substring of the uploader name"),
        ("search" = Option<String>, Query, description = "Matches sample ID, uploader or notes")
    ),
    responses(
        (status = 200, description = "Approved drafts", body = DraftListResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts/archive")]
pub async fn archive_drafts(
    _auth: SessionAuth,
    query: web::Query<FilterCriteria>,
    store: web::Data<DraftStore>,
) -> HttpResponse {
    let drafts = store.list().await;
    HttpResponse::Ok().json(list_response(filter::archive(&drafts, &query)))
}

/// Dashboard counters by status and test type.
#[utoipa::path(
    get,
    path = "/api/v1/drafts/stats",
    tag = "Drafts",
    responses(
        (status = 200, description = "Draft counts", body = DraftStats),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts/stats")]
pub async fn draft_stats(_auth: SessionAuth, store: web::Data<DraftStore>) -> HttpResponse {
    let drafts = store.list().await;
    HttpResponse::Ok().json(DraftStats::from_drafts(&drafts))
}

// ============================================================================
// Upload
// ============================================================================

/// Read a whole multipart field, counting it against the request budget.
async fn read_field(field: &mut Field, used: &mut usize, limit: usize) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::Validation(format!("Read error: {}", e)))?;
        *used += chunk.len();
        if *used > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "upload exceeds the {} byte limit",
                limit
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn field_text(name: &str, data: Vec<u8>) -> AppResult<String> {
    String::from_utf8(data)
        .map_err(|_| AppError::Validation(format!("Field '{}' is not valid UTF-8", name)))
}

/// Parse the upload form into a draft input.
///
/// Text fields: `sample_id`, `test_type`, `notes`. File fields: `image`,
/// `excel_file`. Unknown fields are read and discarded.
async fn parse_upload_form(payload: &mut Multipart, limit: usize) -> AppResult<NewDraft> {
    let mut used = 0usize;
    let mut sample_id = None;
    let mut test_type = None;
    let mut notes = None;
    let mut image = None;
    let mut excel_file = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;

        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| AppError::Validation("Missing content disposition".to_string()))?;
        let name = content_disposition.get_name().unwrap_or_default().to_string();
        let filename = content_disposition.get_filename().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        let data = read_field(&mut field, &mut used, limit).await?;

        match name.as_str() {
            "sample_id" => sample_id = Some(field_text(&name, data)?),
            "test_type" => {
                let raw = field_text(&name, data)?;
                test_type = Some(TestType::parse(&raw).ok_or_else(|| {
                    AppError::Validation(format!("Unknown test type '{}'", raw))
                })?);
            }
            "notes" => notes = Some(field_text(&name, data)?),
            "image" if !data.is_empty() => {
                let filename = filename.unwrap_or_else(|| "image".to_string());
                image = Some(Blob::new(filename, content_type, data)?);
            }
            "excel_file" if !data.is_empty() => {
                let filename = filename.unwrap_or_else(|| "results.xlsx".to_string());
                excel_file = Some(Blob::new(filename, content_type, data)?);
            }
            _ => {}
        }
    }

    Ok(NewDraft {
        sample_id: sample_id.unwrap_or_default(),
        test_type: test_type
            .ok_or_else(|| AppError::Validation("test_type is required".to_string()))?,
        image,
        notes,
        excel_file,
        uploaded_by: String::new(),
    })
}

/// Upload a new draft (technicians only).
///
/// POST /drafts
/// Content-Type: multipart/form-data
#[utoipa::path(
    post,
    path = "/api/v1/drafts",
    tag = "Drafts",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields sample_id, test_type, notes; files image (required) and excel_file. \
                       An application/json body with data URI files (CreateDraftRequest) is also accepted."
    ),
    responses(
        (status = 201, description = "Draft created", body = DraftResponse),
        (status = 400, description = "Missing sample ID, test type or image", body = crate::error::ErrorResponse),
        (status = 403, description = "Engineers cannot upload", body = crate::error::ErrorResponse),
        (status = 413, description = "Upload too large", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[post("/drafts")]
pub async fn create_draft(
    auth: SessionAuth,
    mut payload: Multipart,
    store: web::Data<DraftStore>,
    max_upload_size: web::Data<MaxUploadSize>,
) -> AppResult<HttpResponse> {
    // Reject before reading the body
    lifecycle::authorize_create(&auth.user)?;

    let input = match parse_upload_form(&mut payload, max_upload_size.0).await {
        Ok(input) => input,
        Err(e) => {
            warn!("Rejected upload from {}: {}", auth.user.name, e);
            return Err(e);
        }
    };

    let draft = workflow::submit(&store, &auth.user, input).await?;
    Ok(HttpResponse::Created().json(DraftResponse::from(&draft)))
}

fn is_json(ctx: &GuardContext) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Upload a new draft with data URI attachments (technicians only).
///
/// Shares the documented `POST /drafts` operation; body is [`CreateDraftRequest`].
#[post("/drafts", guard = "is_json")]
pub async fn create_draft_json(
    auth: SessionAuth,
    body: web::Json<CreateDraftRequest>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    lifecycle::authorize_create(&auth.user)?;
    let input = body.into_inner().into_new_draft()?;

    let draft = workflow::submit(&store, &auth.user, input).await?;
    Ok(HttpResponse::Created().json(DraftResponse::from(&draft)))
}

// ============================================================================
// Single draft
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}",
    tag = "Drafts",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Draft", body = DraftResponse),
        (status = 404, description = "Draft not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts/{id}")]
pub async fn get_draft(
    _auth: SessionAuth,
    path: web::Path<String>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let draft = store.get(id).await?;
    Ok(HttpResponse::Ok().json(DraftResponse::from(&draft)))
}

/// Edit sample ID, test type or notes while the draft is under review.
#[utoipa::path(
    patch,
    path = "/api/v1/drafts/{id}",
    tag = "Drafts",
    params(("id" = String, Path, description = "Draft ID")),
    request_body = EditDraftRequest,
    responses(
        (status = 200, description = "Draft updated", body = DraftResponse),
        (status = 404, description = "Draft not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Draft already reviewed", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[patch("/drafts/{id}")]
pub async fn edit_draft(
    auth: SessionAuth,
    path: web::Path<String>,
    body: web::Json<EditDraftRequest>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let draft = workflow::edit(&store, &auth.user, id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DraftResponse::from(&draft)))
}

/// Delete a draft in any status (engineers only).
#[utoipa::path(
    delete,
    path = "/api/v1/drafts/{id}",
    tag = "Drafts",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 204, description = "Draft deleted"),
        (status = 403, description = "Only engineers may delete", body = crate::error::ErrorResponse),
        (status = 404, description = "Draft not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[delete("/drafts/{id}")]
pub async fn delete_draft(
    auth: SessionAuth,
    path: web::Path<String>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    workflow::remove(&store, &auth.user, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// Review
// ============================================================================

/// Notes from an optional review body. An empty body means no notes; anything
/// else must be a valid [`ReviewRequest`].
fn review_notes(body: &[u8]) -> AppResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: ReviewRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid review body: {}", e)))?;
    Ok(request.engineer_notes)
}

/// Approve a draft under review (engineers only).
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/approve",
    tag = "Review",
    params(("id" = String, Path, description = "Draft ID")),
    request_body(content = ReviewRequest, description = "Optional engineer notes"),
    responses(
        (status = 200, description = "Draft approved", body = DraftResponse),
        (status = 400, description = "Malformed review body", body = crate::error::ErrorResponse),
        (status = 403, description = "Only engineers may approve", body = crate::error::ErrorResponse),
        (status = 409, description = "Draft already reviewed", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[post("/drafts/{id}/approve")]
pub async fn approve_draft(
    auth: SessionAuth,
    path: web::Path<String>,
    body: web::Bytes,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let notes = review_notes(&body)?;
    let draft = workflow::approve(&store, &auth.user, id, notes).await?;
    Ok(HttpResponse::Ok().json(DraftResponse::from(&draft)))
}

/// Reject a draft under review (engineers only).
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/reject",
    tag = "Review",
    params(("id" = String, Path, description = "Draft ID")),
    request_body(content = ReviewRequest, description = "Optional rejection notes"),
    responses(
        (status = 200, description = "Draft rejected", body = DraftResponse),
        (status = 400, description = "Malformed review body", body = crate::error::ErrorResponse),
        (status = 403, description = "Only engineers may reject", body = crate::error::ErrorResponse),
        (status = 409, description = "Draft already reviewed", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[post("/drafts/{id}/reject")]
pub async fn reject_draft(
    auth: SessionAuth,
    path: web::Path<String>,
    body: web::Bytes,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let notes = review_notes(&body)?;
    let draft = workflow::reject(&store, &auth.user, id, notes).await?;
    Ok(HttpResponse::Ok().json(DraftResponse::from(&draft)))
}

/// Replace the engineer notes on an approved draft (engineers only).
#[utoipa::path(
    put,
    path = "/api/v1/drafts/{id}/engineer-notes",
    tag = "Review",
    params(("id" = String, Path, description = "Draft ID")),
    request_body = EngineerNotesRequest,
    responses(
        (status = 200, description = "Notes updated", body = DraftResponse),
        (status = 403, description = "Only engineers may annotate", body = crate::error::ErrorResponse),
        (status = 409, description = "Draft is not approved", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[put("/drafts/{id}/engineer-notes")]
pub async fn annotate_draft(
    auth: SessionAuth,
    path: web::Path<String>,
    body: web::Json<EngineerNotesRequest>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let draft =
        workflow::annotate(&store, &auth.user, id, body.into_inner().engineer_notes).await?;
    Ok(HttpResponse::Ok().json(DraftResponse::from(&draft)))
}

// ============================================================================
// Attachments and print
// ============================================================================

/// Download the sample image. Only raster images are served inline.
#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}/image",
    tag = "Drafts",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Draft not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts/{id}/image")]
pub async fn draft_image(
    _auth: SessionAuth,
    path: web::Path<String>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let draft = store.get(id).await?;
    let disposition = if draft.image.is_raster_image() {
        "inline"
    } else {
        "attachment"
    };
    Ok(blob_response(&draft.image, disposition))
}

/// Download the attached spreadsheet.
#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}/excel",
    tag = "Drafts",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Spreadsheet bytes"),
        (status = 404, description = "Draft or spreadsheet not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts/{id}/excel")]
pub async fn draft_excel(
    _auth: SessionAuth,
    path: web::Path<String>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let draft = store.get(id).await?;
    let excel = draft
        .excel_file
        .as_ref()
        .ok_or_else(|| AppError::NotFound(format!("Spreadsheet for draft {}", id)))?;
    Ok(blob_response(excel, "attachment"))
}

/// Printable report for an approved draft.
#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}/print",
    tag = "Drafts",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Self-contained HTML report", body = String, content_type = "text/html"),
        (status = 404, description = "Draft not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Draft is not approved", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/drafts/{id}/print")]
pub async fn print_draft(
    auth: SessionAuth,
    path: web::Path<String>,
    store: web::Data<DraftStore>,
) -> AppResult<HttpResponse> {
    let id = parse_draft_id(&path)?;
    let draft = store.get(id).await?;
    let html = print_report::render(&draft)?;

    info!("Report printed: draft={}, by={}", id, auth.user.name);
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Configure draft routes.
///
/// Fixed paths are registered before `/drafts/{id}` so they are not
/// captured as ids.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_drafts)
        .service(create_draft_json)
        .service(create_draft)
        .service(archive_drafts)
        .service(draft_stats)
        .service(get_draft)
        .service(edit_draft)
        .service(delete_draft)
        .service(approve_draft)
        .service(reject_draft)
        .service(annotate_draft)
        .service(draft_image)
        .service(draft_excel)
        .service(print_draft);
}
