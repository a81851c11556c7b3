use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use church_portal::{
    AppConfig, AppState, MockStorageService,
    auth::AuthUser,
    content::{OrderEntry, Pastor, PastorInput},
    error::{AppError, AppJson},
    handlers::{auth, board, content, site, stats, users},
    models::{
        CreateCommentRequest, CreatePostRequest, NewUser, PostQuery, Role, UpdateRoleRequest,
        User,
    },
    session::{InMemorySessionStore, Session, SessionStore},
    storage::StorageState,
};
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- Test Utilities ---

fn state() -> AppState {
    AppState::in_memory(
        AppConfig::default(),
        Arc::new(MockStorageService::new()) as StorageState,
    )
}

fn caller(role: Role) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        name: "호출자".to_string(),
        email: "caller@church.test".to_string(),
        role,
        token: "sess_test".to_string(),
    }
}

fn pastor(name: &str) -> PastorInput {
    PastorInput {
        name: name.to_string(),
        title: "목사".to_string(),
        bio: String::new(),
        image_url: None,
        email: None,
        order: 0,
        is_active: true,
    }
}

// --- Session ---

#[test]
async fn test_get_session_reports_admin_flag() {
    let Json(admin) = auth::get_session(caller(Role::Admin)).await;
    assert!(admin.is_admin);

    let Json(member) = auth::get_session(caller(Role::User)).await;
    assert!(!member.is_admin);
    assert_eq!(member.user.name, "호출자");
}

// --- Ordered content ---

#[test]
async fn test_content_create_then_public_get() {
    let state = state();

    let (status, Json(created)) =
        content::create::<Pastor>(State(state.clone()), AppJson(pastor("김목사")))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(found) = content::get_active::<Pastor>(State(state.clone()), Path(created.id))
        .await
        .unwrap();
    assert_eq!(found.name, "김목사");

    let missing = content::get_active::<Pastor>(State(state), Path(created.id + 1)).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test]
async fn test_reorder_rejects_duplicate_ids() {
    let state = state();
    let (_, Json(created)) = content::create::<Pastor>(State(state.clone()), AppJson(pastor("A")))
        .await
        .unwrap();

    let result = content::reorder::<Pastor>(
        State(state),
        AppJson(vec![
            OrderEntry { id: created.id, order: 1 },
            OrderEntry { id: created.id, order: 2 },
        ]),
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
}

// --- Board ---

#[test]
async fn test_comment_owner_check() {
    let state = state();
    let author = state
        .repo
        .create_user(church_portal::models::NewUser {
            name: "작성자".to_string(),
            email: "author@church.test".to_string(),
            password_hash: "unused".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();
    let as_author = AuthUser {
        id: author.id,
        ..caller(Role::User)
    };

    let (_, Json(post)) = board::create_post(
        as_author.clone(),
        State(state.clone()),
        AppJson(CreatePostRequest {
            title: "제목".to_string(),
            content: "내용".to_string(),
        }),
    )
    .await
    .unwrap();

    let (_, Json(comment)) = board::add_comment(
        as_author.clone(),
        State(state.clone()),
        Path(post.id),
        AppJson(CreateCommentRequest {
            content: "댓글".to_string(),
        }),
    )
    .await
    .unwrap();

    let stranger = board::delete_comment(caller(Role::User), State(state.clone()), Path(comment.id)).await;
    assert!(matches!(stranger, Err(AppError::NotFound(_))));

    let status = board::delete_comment(caller(Role::Admin), State(state.clone()), Path(comment.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(page) = board::list_posts(State(state), Query(PostQuery::default()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].author_name.as_deref(), Some("작성자"));
}

#[test]
async fn test_non_author_cannot_update_post() {
    let state = state();
    let author = caller(Role::User);
    let (_, Json(post)) = board::create_post(
        author,
        State(state.clone()),
        AppJson(CreatePostRequest {
            title: "제목".to_string(),
            content: "내용".to_string(),
        }),
    )
    .await
    .unwrap();

    let result = board::delete_post(caller(Role::User), State(state), Path(post.id)).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

// --- Site content & stats ---

#[test]
async fn test_site_content_rejects_unknown_key() {
    let result = site::get_site_content(State(state()), Path("banner".to_string())).await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
}

#[test]
async fn test_stats_start_empty() {
    let Json(stats) = stats::get_admin_stats(State(state())).await.unwrap();
    assert_eq!(stats, Default::default());
}

// --- Users ---

/// Session store whose bulk revocation always fails.
struct RevocationFails(InMemorySessionStore);

#[async_trait::async_trait]
impl SessionStore for RevocationFails {
    async fn create(&self, user: &User) -> anyhow::Result<Session> {
        self.0.create(user).await
    }
    async fn get(&self, token: &str) -> anyhow::Result<Option<Session>> {
        self.0.get(token).await
    }
    async fn delete(&self, token: &str) -> anyhow::Result<()> {
        self.0.delete(token).await
    }
    async fn delete_for_user(&self, _: Uuid, _: Option<&str>) -> anyhow::Result<u64> {
        anyhow::bail!("session table unavailable")
    }
    async fn purge_expired(&self) -> anyhow::Result<u64> {
        self.0.purge_expired().await
    }
}

#[test]
async fn test_role_change_stands_when_revocation_fails() {
    let mut state = state();
    state.sessions = Arc::new(RevocationFails(InMemorySessionStore::new(7)));

    let member = state
        .repo
        .create_user(NewUser {
            name: "교인".to_string(),
            email: "member@church.test".to_string(),
            password_hash: "unused".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();

    let Json(updated) = users::update_user_role(
        church_portal::auth::AdminUser(caller(Role::Admin)),
        State(state.clone()),
        Path(member.id),
        AppJson(UpdateRoleRequest { role: Role::Admin }),
    )
    .await
    .unwrap();
    assert_eq!(updated.role, Role::Admin);

    let stored = state.repo.get_user(member.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Admin);
}
