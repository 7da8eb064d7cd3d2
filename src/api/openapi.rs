//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lab Drafts Server",
        version = "0.1.0",
        description = "API server for uploading, reviewing and archiving construction-materials lab drafts"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::login,
        api::auth::logout,
        api::auth::me,
        // Draft endpoints
        api::drafts::list_drafts,
        api::drafts::archive_drafts,
        api::drafts::draft_stats,
        api::drafts::create_draft,
        api::drafts::get_draft,
        api::drafts::edit_draft,
        api::drafts::delete_draft,
        api::drafts::draft_image,
        api::drafts::draft_excel,
        api::drafts::print_draft,
        // Review endpoints
        api::drafts::approve_draft,
        api::drafts::reject_draft,
        api::drafts::annotate_draft,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::BilingualLabel,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::UserRole,
            models::LoginRequest,
            models::LoginResponse,
            models::UserResponse,
            // Drafts
            models::TestType,
            models::DraftStatus,
            models::BlobResponse,
            models::CreateDraftRequest,
            models::EditDraftRequest,
            models::ReviewRequest,
            models::EngineerNotesRequest,
            models::DraftResponse,
            models::DraftListResponse,
            services::DraftStats,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Login and session management"),
        (name = "Drafts", description = "Draft upload, listing, archive and print"),
        (name = "Review", description = "Engineer approval, rejection and notes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add session security schemes (cookie and bearer token).
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{
            ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
        };

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::config::SESSION_COOKIE,
                ))),
            );
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
