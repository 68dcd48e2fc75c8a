use actix_web::http::StatusCode;
use actix_web::test::{call_service, read_body_json, TestRequest};
use serde_json::{json, Value};

use super::test_config;
use crate::test_support::memory_db;

#[actix_web::test]
async fn pinned_notices_come_first() {
    let db = memory_db().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(db, test_config(dir.path()));

    let bodies = [
        json!({ "title": "N", "content": "C", "is_pinned": true }),
        json!({ "title": "M", "content": "C2" }),
        json!({ "title": "O", "content": "C3", "is_pinned": 0 }),
    ];
    for body in bodies {
        let req = TestRequest::post().uri("/api/notice").set_json(body).to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = TestRequest::get().uri("/api/notice").to_request();
    let listed: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(listed["count"], 3);
    let titles: Vec<&str> = listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["N", "O", "M"]);
    assert_eq!(listed["data"][0]["is_pinned"], 1);
    assert_eq!(listed["data"][0]["writer"], "admin");
}

#[actix_web::test]
async fn update_can_unpin() {
    let db = memory_db().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(db, test_config(dir.path()));

    let req = TestRequest::post()
        .uri("/api/notice")
        .set_json(json!({ "title": "N", "content": "C", "is_pinned": "yes" }))
        .to_request();
    let created: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(created["is_pinned"], 1);
    let id = created["id"].as_i64().unwrap();

    let req = TestRequest::put()
        .uri(&format!("/api/notice/{}", id))
        .set_json(json!({ "is_pinned": false }))
        .to_request();
    let updated: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(updated["is_pinned"], 0);
    assert_eq!(updated["title"], "N");

    let req = TestRequest::get().uri(&format!("/api/notice/{}", id)).to_request();
    let fetched: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(fetched["view_count"], 1);
}

#[actix_web::test]
async fn form_posted_notice_is_pinned_by_truthiness() {
    let db = memory_db().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(db, test_config(dir.path()));

    let req = TestRequest::post()
        .uri("/api/notice")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("title=N&content=C&is_pinned=1")
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = read_body_json(resp).await;
    assert_eq!(created["is_pinned"], 1);
    assert_eq!(created["writer"], "admin");

    let req = TestRequest::put()
        .uri(&format!("/api/notice/{}", created["id"]))
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("is_pinned=")
        .to_request();
    let updated: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(updated["is_pinned"], 0);
    assert_eq!(updated["title"], "N");
}
