//! Engineer review flow: approve, reject, annotate and print.

use actix_web::http::header;
use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_engineer_approves_with_notes() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "CON-2024-001", "concrete").await;

    let (status, body) = send_json(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/approve", id)),
        &eng,
        Some(json!({ "engineer_notes": "Strength within spec" })),
    )
    .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["engineer_notes"], "Strength within spec");
    assert_eq!(body["reviewed_by"], "المهندس المسؤول");
}

#[actix_rt::test]
async fn test_approve_without_body() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "CON-2", "concrete").await;

    let (status, body) = send_json(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/approve", id)),
        &eng,
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "approved");
    assert!(body["engineer_notes"].is_null());
}

#[actix_rt::test]
async fn test_technician_cannot_review() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let id = create_draft(&app, &tech, "CON-3", "concrete").await;

    for action in ["approve", "reject"] {
        let (status, body) = send_json(
            &app,
            test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/{}", id, action)),
            &tech,
            None,
        )
        .await;
        assert_eq!(status, 403, "technician should not {}", action);
        assert_eq!(body["error"], "PERMISSION_DENIED");
    }

    let (_, body) = send_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/drafts/{}", id)),
        &tech,
        None,
    )
    .await;
    assert_eq!(body["status"], "under_review");
}

#[actix_rt::test]
async fn test_reviewed_draft_is_final() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "SOIL-1", "soil").await;

    let (status, body) = send_json(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/reject", id)),
        &eng,
        Some(json!({ "engineer_notes": "Moisture sample missing" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["engineer_notes"], "Moisture sample missing");

    let (status, body) = send_json(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/approve", id)),
        &eng,
        None,
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "INVALID_TRANSITION");

    let (status, _) = send_json(
        &app,
        test::TestRequest::patch().uri(&format!("/api/v1/drafts/{}", id)),
        &tech,
        Some(json!({ "notes": "resubmitted" })),
    )
    .await;
    assert_eq!(status, 409);
}

#[actix_rt::test]
async fn test_annotate_approved_draft_only() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "ASP-1", "asphalt").await;
    let notes_uri = format!("/api/v1/drafts/{}/engineer-notes", id);

    let (status, body) = send_json(
        &app,
        test::TestRequest::put().uri(&notes_uri),
        &eng,
        Some(json!({ "engineer_notes": "early note" })),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "INVALID_STATE");

    send_json(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/approve", id)),
        &eng,
        None,
    )
    .await;

    let (status, _) = send_json(
        &app,
        test::TestRequest::put().uri(&notes_uri),
        &tech,
        Some(json!({ "engineer_notes": "tech note" })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send_json(
        &app,
        test::TestRequest::put().uri(&notes_uri),
        &eng,
        Some(json!({ "engineer_notes": "Binder content verified" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["engineer_notes"], "Binder content verified");
    assert_eq!(body["status"], "approved");
}

#[actix_rt::test]
async fn test_print_approved_draft() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "CON-<7>", "concrete").await;
    let print_uri = format!("/api/v1/drafts/{}/print", id);

    let (status, _) =
        send_json(&app, test::TestRequest::get().uri(&print_uri), &tech, None).await;
    assert_eq!(status, 409, "unapproved drafts cannot be printed");

    send_json(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/drafts/{}/approve", id)),
        &eng,
        Some(json!({ "engineer_notes": "OK" })),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&print_uri)
        .insert_header(bearer(&tech))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("CON-&lt;7&gt;"));
    assert!(!html.contains("CON-<7>"));
    assert!(html.contains("dir=\"rtl\""));
    assert!(html.contains("مختبرات مواد البناء"));
}

#[actix_rt::test]
async fn test_malformed_review_body_leaves_draft_under_review() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "CON-9", "concrete").await;

    let bodies: [(&str, &[u8]); 3] = [
        ("application/json", b"{\"engineer_notes\": "),
        ("application/json", b"{\"engineer_notes\": 42}"),
        ("text/plain", b"looks fine"),
    ];
    for action in ["approve", "reject"] {
        for (content_type, payload) in bodies {
            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/drafts/{}/{}", id, action))
                .insert_header(bearer(&eng))
                .insert_header((header::CONTENT_TYPE, content_type))
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "{} with {:?}", action, payload);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "VALIDATION_ERROR");
        }
    }

    let (_, body) = send_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/drafts/{}", id)),
        &tech,
        None,
    )
    .await;
    assert_eq!(body["status"], "under_review");
    assert!(body["engineer_notes"].is_null());
}

#[actix_rt::test]
async fn test_whitespace_review_body_means_no_notes() {
    let app = create_test_app().await;
    let tech = login(&app, TECHNICIAN).await;
    let eng = login(&app, ENGINEER).await;
    let id = create_draft(&app, &tech, "CON-10", "concrete").await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/drafts/{}/reject", id))
        .insert_header(bearer(&eng))
        .set_payload(" \n")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "rejected");
    assert!(body["engineer_notes"].is_null());
}
