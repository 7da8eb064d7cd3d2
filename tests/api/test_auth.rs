//! Login, logout and session checks.

use actix_web::cookie::Cookie;
use actix_web::test;
use lab_drafts_lib::config::SESSION_COOKIE;
use serde_json::{Value, json};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_login_sets_cookie_and_returns_user() {
    let app = create_test_app().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": ENGINEER, "password": "elkasaby1988" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie should be set");
    assert!(cookie.http_only().unwrap_or(false));
    let cookie_value = cookie.value().to_string();

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["role"], "engineer");
    assert_eq!(body["user"]["name"], "المهندس المسؤول");
    assert_eq!(body["token"], cookie_value.as_str());
}

#[actix_rt::test]
async fn test_login_rejects_wrong_password() {
    let app = create_test_app().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": TECHNICIAN, "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_login_rejects_unknown_user() {
    let app = create_test_app().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": "nobody", "password": "elkasaby1988" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_me_with_bearer_token() {
    let app = create_test_app().await;
    let token = login(&app, TECHNICIAN).await;

    let (status, body) =
        send_json(&app, test::TestRequest::get().uri("/api/v1/auth/me"), &token, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["role"], "technician");
    assert_eq!(body["role_label"]["english"], "Lab Technician");
}

#[actix_rt::test]
async fn test_me_with_session_cookie() {
    let app = create_test_app().await;
    let token = login(&app, ENGINEER).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .cookie(Cookie::new(SESSION_COOKIE, token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_protected_routes_require_session() {
    let app = create_test_app().await;

    for uri in ["/api/v1/auth/me", "/api/v1/drafts", "/api/v1/drafts/archive"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401, "{} should require a session", uri);
    }

    let (status, _) = send_json(
        &app,
        test::TestRequest::get().uri("/api/v1/drafts"),
        "lab_not-a-real-token",
        None,
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_logout_ends_session() {
    let app = create_test_app().await;
    let token = login(&app, TECHNICIAN).await;

    let (status, body) =
        send_json(&app, test::TestRequest::post().uri("/api/v1/auth/logout"), &token, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Logged out");

    let (status, _) =
        send_json(&app, test::TestRequest::get().uri("/api/v1/auth/me"), &token, None).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_logout_without_session_is_ok() {
    let app = create_test_app().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_sessions_are_independent() {
    let app = create_test_app().await;
    let first = login(&app, TECHNICIAN).await;
    let second = login(&app, TECHNICIAN).await;
    assert_ne!(first, second);

    send_json(&app, test::TestRequest::post().uri("/api/v1/auth/logout"), &first, None).await;

    let (status, _) =
        send_json(&app, test::TestRequest::get().uri("/api/v1/auth/me"), &second, None).await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_health_is_public() {
    let app = create_test_app().await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
