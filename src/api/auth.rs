//! Login endpoints for the mock lab accounts.
//!
//! Login issues an opaque session token, returned in the body and set as the
//! HttpOnly `lab_session` cookie. Sessions never expire; logout ends them.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use secrecy::ExposeSecret;

use crate::auth::{SessionAuth, session_token};
use crate::config::{Config, SESSION_COOKIE};
use crate::error::AppResult;
use crate::models::{LoginRequest, LoginResponse, UserResponse};
use crate::services::SessionRegistry;

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

/// Log in with username and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
#[post("/auth/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    registry: web::Data<SessionRegistry>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let (token, user) = registry.login(&body).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            token.clone(),
            config.environment.is_production(),
        ))
        .json(LoginResponse {
            token,
            user: user.into(),
        }))
}

/// End the current session, if any, and clear the cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out")
    )
)]
#[post("/auth/logout")]
pub async fn logout(
    req: HttpRequest,
    registry: web::Data<SessionRegistry>,
    config: web::Data<Config>,
) -> HttpResponse {
    if let Some(token) = session_token(&req) {
        registry.logout(token.expose_secret()).await;
    }

    let mut clear = session_cookie(String::new(), config.environment.is_production());
    clear.make_removal();

    HttpResponse::Ok()
        .cookie(clear)
        .json(serde_json::json!({ "message": "Logged out" }))
}

/// Get the logged-in user.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
#[get("/auth/me")]
pub async fn me(auth: SessionAuth) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(auth.user))
}

/// Configure auth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login).service(logout).service(me);
}
