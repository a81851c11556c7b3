#![allow(dead_code)]

use church_portal::{
    AppConfig, AppState, LocalDiskStorage, bootstrap, create_router,
    config::SeedAdmin,
    models::{Role, User},
    repository::normalize_email,
    storage::{StorageService, StorageState},
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@church.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const MEMBER_PASSWORD: &str = "member-password";

/// A running in-memory server on a random port.
pub struct TestApp {
    pub address: String,
    pub state: AppState,
    /// Kept alive for the duration of the test; uploads land here.
    pub upload_dir: TempDir,
}

pub fn test_config(upload_dir: &TempDir) -> AppConfig {
    AppConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        login_max_attempts: 3,
        seed_admin: Some(SeedAdmin {
            name: "관리자".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }),
        ..AppConfig::default()
    }
}

/// In-memory state with the seed admin already created.
pub async fn test_state(upload_dir: &TempDir) -> AppState {
    let config = test_config(upload_dir);
    let disk = LocalDiskStorage::new(&config.upload_dir);
    disk.ensure_ready().await.expect("upload dir");
    let state = AppState::in_memory(config, Arc::new(disk) as StorageState);

    let seed = state.config.seed_admin.clone().expect("seed configured");
    bootstrap::seed_admin(&state.repo, &seed)
        .await
        .expect("seed admin");
    state
}

pub async fn spawn_app() -> TestApp {
    let upload_dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(&upload_dir).await;
    let router = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        state,
        upload_dir,
    }
}

/// Client with its own cookie jar, i.e. one browser.
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("client")
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, client: &Client, email: &str, password: &str) -> reqwest::Response {
        client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request")
    }

    pub async fn admin(&self) -> Client {
        let client = browser();
        let response = self.login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        client
    }

    /// Registers a member through the public endpoint and returns a logged-in client.
    pub async fn member(&self, name: &str, email: &str) -> Client {
        let client = browser();
        let response = client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": MEMBER_PASSWORD }))
            .send()
            .await
            .expect("register request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self.login(&client, email, MEMBER_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        client
    }

    pub async fn user(&self, email: &str) -> User {
        self.state
            .repo
            .find_user_by_email(&normalize_email(email))
            .await
            .expect("repo")
            .expect("user exists")
    }

    pub async fn admin_user(&self) -> User {
        let user = self.user(ADMIN_EMAIL).await;
        assert_eq!(user.role, Role::Admin);
        user
    }
}

pub async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.expect("json body")
}
