mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use church_portal::{
    AppState, MockStorageService, create_router,
    models::{NewUser, Role, UploadResponse},
    storage::StorageState,
};
use common::{ADMIN_EMAIL, test_state};
use std::sync::Arc;
use tower::util::ServiceExt;

const BOUNDARY: &str = "church-portal-test-boundary";

fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(cookie: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/admin/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn session_cookie(state: &AppState, email: &str) -> String {
    let user = state
        .repo
        .find_user_by_email(email)
        .await
        .unwrap()
        .unwrap();
    let session = state.sessions.create(&user).await.unwrap();
    format!("sessionId={}", session.token)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_upload_stores_and_serves_image() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;
    let cookie = session_cookie(&state, ADMIN_EMAIL).await;
    let router = create_router(state);

    let image = b"\x89PNG fake image bytes".to_vec();
    let (status, body) = send(
        &router,
        upload_request(Some(&cookie), multipart_body("file", "Logo.PNG", &image)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uploaded: UploadResponse = serde_json::from_slice(&body).unwrap();
    assert!(uploaded.url.starts_with("/uploads/"));
    assert!(uploaded.filename.ends_with(".png"));
    assert_eq!(uploaded.url, format!("/uploads/{}", uploaded.filename));
    assert_eq!(uploaded.size, image.len());

    let on_disk = tokio::fs::read(dir.path().join(&uploaded.filename)).await.unwrap();
    assert_eq!(on_disk, image);

    let (status, served) = send(
        &router,
        Request::builder()
            .uri(&uploaded.url)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, image);
}

#[tokio::test]
async fn test_upload_rejects_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;
    let cookie = session_cookie(&state, ADMIN_EMAIL).await;
    let limit = state.config.max_upload_bytes;
    let router = create_router(state);

    let (status, _) = send(
        &router,
        upload_request(Some(&cookie), multipart_body("file", "virus.exe", b"MZ")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_big = vec![0u8; limit + 1];
    let (status, _) = send(
        &router,
        upload_request(Some(&cookie), multipart_body("file", "huge.jpg", &too_big)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        upload_request(Some(&cookie), multipart_body("image", "photo.jpg", b"jpg")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        upload_request(Some(&cookie), multipart_body("file", "empty.jpg", b"")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_requires_admin() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    state
        .repo
        .create_user(NewUser {
            name: "교인".to_string(),
            email: "member@church.test".to_string(),
            password_hash: "unused".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();
    let member_cookie = session_cookie(&state, "member@church.test").await;
    let router = create_router(state);

    let (status, _) = send(
        &router,
        upload_request(None, multipart_body("file", "photo.jpg", b"jpg")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        upload_request(Some(&member_cookie), multipart_body("file", "photo.jpg", b"jpg")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state(&dir).await;
    state.storage = Arc::new(MockStorageService::new_failing()) as StorageState;
    let cookie = session_cookie(&state, ADMIN_EMAIL).await;
    let router = create_router(state);

    let (status, body) = send(
        &router,
        upload_request(Some(&cookie), multipart_body("file", "photo.jpg", b"jpg")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(!body["error"].as_str().unwrap().contains("mock"));
}
