mod common;

use common::{json_body, spawn_app};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_unknown_and_unset_keys() {
    let app = spawn_app().await;

    let response = reqwest::get(app.url("/api/site-content/footer")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = reqwest::get(app.url("/api/site-content/hero")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list = json_body(reqwest::get(app.url("/api/site-content")).await.unwrap()).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_replaces_a_block() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let response = admin
        .put(app.url("/api/admin/site-content/hero"))
        .json(&json!({ "title": "환영합니다", "subtitle": "함께 예배해요" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stored = json_body(response).await;
    assert_eq!(stored["key"], "hero");
    assert_eq!(stored["content"]["title"], "환영합니다");
    assert!(stored["updatedAt"].is_string());

    admin
        .put(app.url("/api/admin/site-content/hero"))
        .json(&json!({ "title": "성탄 예배", "subtitle": "12월 25일 오전 11시" }))
        .send()
        .await
        .unwrap();

    let block = json_body(reqwest::get(app.url("/api/site-content/hero")).await.unwrap()).await;
    assert_eq!(block["content"]["title"], "성탄 예배");
    assert!(block["content"].get("backgroundImage").is_none());

    let list = json_body(reqwest::get(app.url("/api/site-content")).await.unwrap()).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_block_shape_is_enforced() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let missing = admin
        .put(app.url("/api/admin/site-content/hero"))
        .json(&json!({ "title": "부제 없음" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let extra = admin
        .put(app.url("/api/admin/site-content/contact"))
        .json(&json!({ "address": "서울시", "fax": "02-000-0000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(extra.status(), StatusCode::BAD_REQUEST);

    let worship = admin
        .put(app.url("/api/admin/site-content/worship_times"))
        .json(&json!({
            "services": [
                { "name": "주일 1부", "time": "09:00", "place": "본당" },
                { "name": "주일 2부", "time": "11:00", "place": "본당" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(worship.status(), StatusCode::OK);
    let worship = json_body(worship).await;
    assert_eq!(worship["key"], "worship_times");
    assert_eq!(worship["content"]["services"][1]["time"], "11:00");
}

#[tokio::test]
async fn test_delete_block_and_permissions() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let member = app.member("교인", "member@church.test").await;

    let response = member
        .put(app.url("/api/admin/site-content/vision"))
        .json(&json!({ "statement": "예배하는 교회" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    admin
        .put(app.url("/api/admin/site-content/vision"))
        .json(&json!({ "statement": "예배하는 교회", "values": ["예배", "교제"] }))
        .send()
        .await
        .unwrap();

    let response = admin
        .delete(app.url("/api/admin/site-content/vision"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = admin
        .delete(app.url("/api/admin/site-content/vision"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
