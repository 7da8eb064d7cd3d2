//! Actix-web extractor for session authentication.
//!
//! # Security
//! - Session tokens are wrapped in `SecretString` as soon as they are read
//! - Tokens are never logged; the registry only ever sees their hash

use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use futures_util::future::LocalBoxFuture;
use secrecy::{ExposeSecret, SecretString};

use crate::config::SESSION_COOKIE;
use crate::error::ErrorResponse;
use crate::models::User;
use crate::services::SessionRegistry;

/// Read the session token from the `Authorization: Bearer` header or,
/// failing that, the session cookie.
pub fn session_token(req: &HttpRequest) -> Option<SecretString> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| SecretString::from(t.to_string()));

    bearer.or_else(|| {
        req.cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    })
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl AuthError {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor that requires a logged-in session.
///
/// ```ignore
/// async fn protected_handler(auth: SessionAuth) -> impl Responder {
///     // auth.user is the logged-in technician or engineer
/// }
/// ```
pub struct SessionAuth {
    pub user: User,
}

impl FromRequest for SessionAuth {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let registry = req.app_data::<web::Data<SessionRegistry>>().cloned();
        let token = session_token(req);

        Box::pin(async move {
            let registry =
                registry.ok_or_else(|| AuthError::new("Internal configuration error"))?;
            let token = token.ok_or_else(|| {
                AuthError::new("Missing session. Log in and send the session cookie or a Bearer token.")
            })?;

            match registry.resolve(token.expose_secret()).await {
                Some(user) => Ok(SessionAuth { user }),
                None => Err(AuthError::new("Session expired or invalid. Log in again.")),
            }
        })
    }
}
