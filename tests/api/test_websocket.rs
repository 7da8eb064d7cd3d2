//! Live dashboard updates over `/ws`.

use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test};
use awc::ws::Frame;
use futures_util::StreamExt;
use lab_drafts_lib::config::defaults;
use serde_json::{Value, json};

use super::test_helpers::*;

fn upgrade_request() -> test::TestRequest {
    test::TestRequest::get()
        .uri("/api/v1/ws")
        .insert_header((header::CONNECTION, "upgrade"))
        .insert_header((header::UPGRADE, "websocket"))
        .insert_header((header::SEC_WEBSOCKET_VERSION, "13"))
        .insert_header((header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ=="))
}

#[actix_rt::test]
async fn test_upgrade_without_session_is_unauthorized() {
    let app = create_test_app().await;

    let resp = test::call_service(&app, upgrade_request().to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");

    let req = upgrade_request()
        .insert_header(bearer("lab_forged"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_upgrade_with_session_switches_protocols() {
    let app = create_test_app().await;
    let token = login(&app, ENGINEER).await;

    let req = upgrade_request().insert_header(bearer(&token)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SWITCHING_PROTOCOLS);
}

#[actix_rt::test]
async fn test_created_draft_is_pushed_to_connected_dashboard() {
    let state = TestState::new(defaults::DEV_MAX_UPLOAD_SIZE);
    let srv = actix_test::start(move || App::new().configure(|cfg| state.configure(cfg)));

    let mut resp = srv
        .post("/api/v1/auth/login")
        .send_json(&json!({
            "username": TECHNICIAN,
            "password": defaults::DEV_PASSWORD,
        }))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let (resp, mut ws) = awc::Client::new()
        .ws(srv.url("/api/v1/ws"))
        .bearer_auth(&token)
        .connect()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SWITCHING_PROTOCOLS);

    let mut resp = srv
        .post("/api/v1/drafts")
        .bearer_auth(&token)
        .send_json(&json!({
            "sample_id": "CON-WS-1",
            "test_type": "concrete",
            "image_name": "core.png",
            "image": PNG_DATA_URI,
        }))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();

    // The server pings right after connecting
    let text = loop {
        let frame = actix_rt::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("no frame within 5s")
            .expect("socket closed")
            .unwrap();
        match frame {
            Frame::Text(bytes) => break bytes,
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    };

    let event: Value = serde_json::from_slice(&text).unwrap();
    assert_eq!(event["type"], "draft_created");
    assert_eq!(event["payload"]["draft_id"], created["id"]);
    assert_eq!(event["payload"]["sample_id"], "CON-WS-1");
    assert_eq!(event["payload"]["test_type"], "concrete");
    assert_eq!(event["payload"]["status"], "under_review");
    assert_eq!(event["payload"]["uploaded_by"], "فني المختبر");
    assert!(event["timestamp"].is_string());
}
