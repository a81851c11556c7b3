mod common;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, MEMBER_PASSWORD, browser, json_body, spawn_app};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_admin_creates_and_lists_users() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let response = admin
        .post(app.url("/api/admin/users"))
        .json(&json!({
            "name": "부목사",
            "email": "associate@church.test",
            "password": "associate-pass",
            "role": "admin"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["role"], "admin");

    let response = admin
        .post(app.url("/api/admin/users"))
        .json(&json!({ "name": "교인", "email": "plain@church.test", "password": "plain-pass-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(response).await["role"], "user");

    let users = json_body(admin.get(app.url("/api/admin/users")).send().await.unwrap()).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
    assert_eq!(users[0]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_last_admin_cannot_be_demoted_or_deleted() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let me = app.admin_user().await;

    let response = admin
        .put(app.url(&format!("/api/admin/users/{}/role", me.id)))
        .json(&json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin
        .delete(app.url(&format!("/api/admin/users/{}", me.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.state.repo.count_admins().await.unwrap(), 1);
    let session = admin.get(app.url("/api/auth/session")).send().await.unwrap();
    assert_eq!(session.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_demotion_allowed_with_second_admin_and_revokes_sessions() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let member = app.member("집사", "deacon@church.test").await;
    let deacon = app.user("deacon@church.test").await;

    let response = admin
        .put(app.url(&format!("/api/admin/users/{}/role", deacon.id)))
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Promotion logged the member out; the next login carries the new role.
    let response = member.get(app.url("/api/auth/session")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let promoted = browser();
    app.login(&promoted, "deacon@church.test", MEMBER_PASSWORD).await;
    let response = promoted.get(app.url("/api/admin/users")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // With two admins the seed admin can step down.
    let me = app.admin_user().await;
    let response = promoted
        .put(app.url(&format!("/api/admin/users/{}/role", me.id)))
        .json(&json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin.get(app.url("/api/admin/users")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let demoted = browser();
    app.login(&demoted, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let response = demoted.get(app.url("/api/admin/users")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_resets_password() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let member = app.member("교인", "forgetful@church.test").await;
    let user = app.user("forgetful@church.test").await;

    let weak = admin
        .put(app.url(&format!("/api/admin/users/{}/password", user.id)))
        .json(&json!({ "newPassword": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let response = admin
        .put(app.url(&format!("/api/admin/users/{}/password", user.id)))
        .json(&json!({ "newPassword": "temporary-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = member.get(app.url("/api/auth/session")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .login(&browser(), "forgetful@church.test", "temporary-pass")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let missing = admin
        .put(app.url(&format!("/api/admin/users/{}/password", uuid::Uuid::new_v4())))
        .json(&json!({ "newPassword": "temporary-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_member_keeps_their_posts() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let member = app.member("교인", "leaving@church.test").await;
    let user = app.user("leaving@church.test").await;

    let post = json_body(
        member
            .post(app.url("/api/posts"))
            .json(&json!({ "title": "감사 인사", "content": "그동안 감사했습니다." }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let response = admin
        .delete(app.url(&format!("/api/admin/users/{}", user.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = member.get(app.url("/api/auth/session")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let id = post["id"].as_str().unwrap();
    let post = json_body(reqwest::get(app.url(&format!("/api/posts/{id}"))).await.unwrap()).await;
    assert!(post["authorId"].is_null());

    let response = admin
        .delete(app.url(&format!("/api/admin/users/{}", user.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_count_users_posts_and_comments() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let member = app.member("교인", "stats@church.test").await;

    let post = json_body(
        member
            .post(app.url("/api/posts"))
            .json(&json!({ "title": "기도 제목", "content": "함께 기도해주세요." }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let id = post["id"].as_str().unwrap();
    member
        .post(app.url(&format!("/api/posts/{id}/comments")))
        .json(&json!({ "content": "기도하겠습니다." }))
        .send()
        .await
        .unwrap();
    admin
        .put(app.url(&format!("/api/admin/posts/{id}/visibility")))
        .json(&json!({ "isActive": false }))
        .send()
        .await
        .unwrap();

    let stats = json_body(admin.get(app.url("/api/admin/stats")).send().await.unwrap()).await;
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalAdmins"], 1);
    assert_eq!(stats["totalPosts"], 1);
    assert_eq!(stats["hiddenPosts"], 1);
    assert_eq!(stats["totalComments"], 1);
}
