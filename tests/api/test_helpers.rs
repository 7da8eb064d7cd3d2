//! Shared helpers for API tests.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{App, dev::ServiceResponse, test, web};
use lab_drafts_lib::api;
use lab_drafts_lib::config::{Config, MaxUploadSize, defaults};
use lab_drafts_lib::services::{
    CredentialStore, DraftStore, EventBroadcaster, InMemoryDraftRepository, SessionRegistry,
};
use serde_json::{Value, json};

pub const TECHNICIAN: &str = "elkasaby.tech";
pub const ENGINEER: &str = "elkasaby.eng";

/// "PNG" in base64.
pub const PNG_DATA_URI: &str = "data:image/png;base64,UE5H";

const BOUNDARY: &str = "----lab-drafts-test-boundary";

pub fn dev_config() -> Config {
    Config::from_lookup(|key| (key == "RUST_ENV").then(|| "development".to_string()))
        .expect("development config should load without other variables")
}

/// App state shared by every worker of one test app.
#[derive(Clone)]
pub struct TestState {
    store: web::Data<DraftStore>,
    registry: web::Data<SessionRegistry>,
    broadcaster: web::Data<EventBroadcaster>,
    config: web::Data<Config>,
    max_upload_size: usize,
}

impl TestState {
    /// Empty in-memory repository and the development accounts.
    pub fn new(max_upload_size: usize) -> Self {
        let config = dev_config();
        let broadcaster = EventBroadcaster::new();
        let store = DraftStore::empty(Arc::new(InMemoryDraftRepository::new()))
            .with_events(broadcaster.clone());
        let registry = SessionRegistry::new(CredentialStore::new(config.users.clone()));

        Self {
            store: web::Data::new(store),
            registry: web::Data::new(registry),
            broadcaster: web::Data::new(broadcaster),
            config: web::Data::new(config),
            max_upload_size,
        }
    }

    /// Register state and the `/api/v1` routes, as `main` does.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.store.clone())
            .app_data(self.registry.clone())
            .app_data(self.broadcaster.clone())
            .app_data(self.config.clone())
            .app_data(web::Data::new(MaxUploadSize(self.max_upload_size)))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_auth_routes)
                    .configure(api::configure_draft_routes)
                    .configure(api::configure_websocket_routes),
            );
    }
}

/// Create a test app with the default upload limit.
pub async fn create_test_app() -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    create_test_app_with_limit(defaults::DEV_MAX_UPLOAD_SIZE).await
}

/// Create a test app backed by an empty in-memory repository.
pub async fn create_test_app_with_limit(
    max_upload_size: usize,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let state = TestState::new(max_upload_size);
    test::init_service(App::new().configure(|cfg| state.configure(cfg))).await
}

/// Log in with a development account and return the session token.
pub async fn login<S>(app: &S, username: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "username": username,
            "password": defaults::DEV_PASSWORD,
        }))
        .to_request();

    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "login failed: {}", resp.status());
    let body: Value = test::read_body_json(resp).await;
    body["token"]
        .as_str()
        .expect("login response should carry a token")
        .to_string()
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

/// Encode parts as a `multipart/form-data` body, returning (content type, body).
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// Upload a draft as multipart form data.
pub async fn upload_draft<S>(app: &S, token: &str, parts: &[Part<'_>]) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (content_type, body) = multipart_body(parts);
    let req = test::TestRequest::post()
        .uri("/api/v1/drafts")
        .insert_header(bearer(token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Upload a minimal valid draft and return its id.
pub async fn create_draft<S>(app: &S, token: &str, sample_id: &str, test_type: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = upload_draft(
        app,
        token,
        &[
            Part::Text("sample_id", sample_id),
            Part::Text("test_type", test_type),
            Part::File {
                name: "image",
                filename: "sample.png",
                content_type: "image/png",
                data: b"PNG",
            },
        ],
    )
    .await;
    assert_eq!(status, 201, "draft upload failed: {}", body);
    body["id"].as_str().expect("draft id").to_string()
}

/// Send a JSON request with a session and return (status, body).
///
/// The body is `Value::Null` when the response is empty.
pub async fn send_json<S>(
    app: &S,
    req: test::TestRequest,
    token: &str,
    body: Option<Value>,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut req = req.insert_header(bearer(token));
    if let Some(body) = body {
        req = req.set_json(body);
    }

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
