//! Listing, filtering, archive and dashboard stats.

use actix_web::test;
use chrono::{Duration, Local};
use serde_json::{Value, json};

use super::test_helpers::*;

/// Seed three drafts and approve the concrete one.
///
/// Returns (technician token, engineer token).
async fn seed<S>(app: &S) -> (String, String)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let tech = login(app, TECHNICIAN).await;
    let eng = login(app, ENGINEER).await;

    let concrete = create_draft(app, &tech, "CON-2024-001", "concrete").await;
    create_draft(app, &tech, "ASP-2024-002", "asphalt").await;

    let (status, body) = upload_draft(
        app,
        &tech,
        &[
            Part::Text("sample_id", "SOIL-2024-003"),
            Part::Text("test_type", "soil"),
            Part::Text("notes", "Proctor compaction"),
            Part::File {
                name: "image",
                filename: "soil.png",
                content_type: "image/png",
                data: b"PNG",
            },
        ],
    )
    .await;
    assert_eq!(status, 201, "{}", body);

    let (status, _) = send_json(
        app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/approve", concrete)),
        &eng,
        Some(json!({ "engineer_notes": "Passed" })),
    )
    .await;
    assert_eq!(status, 200);

    (tech, eng)
}

fn sample_ids(body: &Value) -> Vec<String> {
    body["drafts"]
        .as_array()
        .expect("drafts array")
        .iter()
        .map(|d| d["sample_id"].as_str().unwrap().to_string())
        .collect()
}

async fn list<S>(app: &S, token: &str, uri: &str) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = send_json(app, test::TestRequest::get().uri(uri), token, None).await;
    assert_eq!(status, 200, "GET {} failed: {}", uri, body);
    body
}

#[actix_rt::test]
async fn test_list_is_newest_first() {
    let app = create_test_app().await;
    let (tech, _) = seed(&app).await;

    let body = list(&app, &tech, "/api/v1/drafts").await;
    assert_eq!(body["total"], 3);
    assert_eq!(
        sample_ids(&body),
        vec!["SOIL-2024-003", "ASP-2024-002", "CON-2024-001"]
    );
}

#[actix_rt::test]
async fn test_filter_by_type_and_status() {
    let app = create_test_app().await;
    let (tech, _) = seed(&app).await;

    let body = list(&app, &tech, "/api/v1/drafts?test_type=soil").await;
    assert_eq!(sample_ids(&body), vec!["SOIL-2024-003"]);

    let body = list(&app, &tech, "/api/v1/drafts?status=pending").await;
    assert_eq!(sample_ids(&body), vec!["SOIL-2024-003", "ASP-2024-002"]);

    let body = list(&app, &tech, "/api/v1/drafts?status=approved&test_type=all").await;
    assert_eq!(sample_ids(&body), vec!["CON-2024-001"]);
}

#[actix_rt::test]
async fn test_filter_by_text_fields() {
    let app = create_test_app().await;
    let (tech, _) = seed(&app).await;

    let body = list(&app, &tech, "/api/v1/drafts?sample_id=asp").await;
    assert_eq!(sample_ids(&body), vec!["ASP-2024-002"]);

    let body = list(&app, &tech, "/api/v1/drafts?notes=proctor").await;
    assert_eq!(sample_ids(&body), vec!["SOIL-2024-003"]);

    let body = list(&app, &tech, "/api/v1/drafts?search=2024-00").await;
    assert_eq!(body["total"], 3);

    let body = list(&app, &tech, "/api/v1/drafts?search=nothing-matches").await;
    assert_eq!(body["total"], 0);
}

#[actix_rt::test]
async fn test_filter_by_upload_day() {
    let app = create_test_app().await;
    let (tech, _) = seed(&app).await;

    let yesterday = (Local::now() - Duration::days(1)).format("%Y-%m-%d");
    let body = list(&app, &tech, &format!("/api/v1/drafts?date={}", yesterday)).await;
    assert_eq!(body["total"], 0);

    let (status, _) = send_json(
        &app,
        test::TestRequest::get().uri("/api/v1/drafts?date=16-10-2026"),
        &tech,
        None,
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_unknown_status_is_rejected() {
    let app = create_test_app().await;
    let (tech, _) = seed(&app).await;

    let (status, _) = send_json(
        &app,
        test::TestRequest::get().uri("/api/v1/drafts?status=archived"),
        &tech,
        None,
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_archive_holds_approved_only() {
    let app = create_test_app().await;
    let (tech, _) = seed(&app).await;

    let body = list(&app, &tech, "/api/v1/drafts/archive").await;
    assert_eq!(sample_ids(&body), vec!["CON-2024-001"]);
    assert_eq!(body["drafts"][0]["engineer_notes"], "Passed");

    let body = list(&app, &tech, "/api/v1/drafts/archive?status=under_review").await;
    assert_eq!(body["total"], 0);

    let body = list(&app, &tech, "/api/v1/drafts/archive?test_type=soil").await;
    assert_eq!(body["total"], 0);
}

#[actix_rt::test]
async fn test_stats_counts_and_badge() {
    let app = create_test_app().await;
    let (_, eng) = seed(&app).await;

    let body = list(&app, &eng, "/api/v1/drafts/stats").await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["under_review"], 2);
    assert_eq!(body["approved"], 1);
    assert_eq!(body["rejected"], 0);
    assert_eq!(body["concrete"], 1);
    assert_eq!(body["asphalt"], 1);
    assert_eq!(body["soil"], 1);
    assert_eq!(body["pending_badge"], "2");
}

#[actix_rt::test]
async fn test_stats_empty() {
    let app = create_test_app().await;
    let token = login(&app, ENGINEER).await;

    let body = list(&app, &token, "/api/v1/drafts/stats").await;
    assert_eq!(body["total"], 0);
    assert!(body["pending_badge"].is_null());
}
