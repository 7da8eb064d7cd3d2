//! Lab Drafts Server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lab_drafts_lib::api;
use lab_drafts_lib::config::{Config, MaxUploadSize, StorageBackend};
use lab_drafts_lib::db::DbPool;
use lab_drafts_lib::middleware::RequestLogger;
use lab_drafts_lib::services::{
    CredentialStore, DraftRepository, DraftStore, EventBroadcaster, InMemoryDraftRepository,
    SessionRegistry,
};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

/// Build the draft repository for the configured backend.
async fn open_repository(config: &Config) -> Result<Arc<dyn DraftRepository>, String> {
    match config.storage {
        StorageBackend::Memory => {
            warn!("Drafts are kept in memory and will be lost on restart");
            Ok(Arc::new(InMemoryDraftRepository::new()))
        }
        StorageBackend::Postgres => {
            let pool = DbPool::new(&config.database)
                .await
                .map_err(|e| format!("Failed to connect to database: {}", e))?;
            info!("Database connection established");

            pool.run_migrations()
                .await
                .map_err(|e| format!("Failed to run migrations: {}", e))?;

            Ok(Arc::new(pool))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, LAB_USERS must be set and DATABASE_URL must point at PostgreSQL");
            error!("  - In production, passwords must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Lab Drafts Server");
    info!("  Environment: {}", config.environment);
    info!("  Storage: {}", config.storage);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development default accounts");
    }

    let repository = match open_repository(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let broadcaster = EventBroadcaster::new();
    let store = match DraftStore::load(repository).await {
        Ok(store) => store.with_events(broadcaster.clone()),
        Err(e) => {
            error!("Failed to load drafts: {}", e);
            std::process::exit(1);
        }
    };

    let store = web::Data::new(store);
    let registry = web::Data::new(SessionRegistry::new(CredentialStore::new(
        config.users.clone(),
    )));
    let broadcaster = web::Data::new(broadcaster);
    let shared_config = web::Data::new(config.clone());

    let bind_address = config.bind_address();
    let max_upload_size = config.max_upload_size;
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    info!(
        "Upload limit: {}MB per draft",
        max_upload_size / 1024 / 1024
    );

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let server = HttpServer::new(move || {
        let methods = vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];
        let headers = vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE];

        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(methods)
                .allowed_headers(headers)
                .supports_credentials()
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(methods)
                .allowed_headers(headers)
                .max_age(3600)
        };

        let mut app = App::new()
            // CORS must wrap before other middleware
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(store.clone())
            .app_data(registry.clone())
            .app_data(broadcaster.clone())
            .app_data(shared_config.clone())
            .app_data(web::Data::new(MaxUploadSize(max_upload_size)))
            // Data URI bodies are about a third larger than the raw files
            .app_data(web::JsonConfig::default().limit(max_upload_size * 4 / 3 + 4096))
            .app_data(web::PayloadConfig::new(max_upload_size * 2))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_auth_routes)
                    .configure(api::configure_draft_routes)
                    .configure(api::configure_websocket_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            );

        // Serve the built frontend when LAB_STATIC_DIR is set
        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .service(Files::new("/favicon", dir.clone()).index_file("favicon.ico"))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
