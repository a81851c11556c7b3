use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod session;
pub mod site_content;
pub mod storage;

// Router segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{AdminUser, AuthUser, LoginThrottle};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use content::ContentStores;
pub use error::AppError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use session::{InMemorySessionStore, PostgresSessionStore, SessionState};
pub use storage::{LocalDiskStorage, MockStorageService, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`. The ordered content routes are
/// generic over the entity and are described through their schemas only.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::logout, handlers::auth::get_session,
        handlers::auth::register, handlers::auth::change_password,
        handlers::users::list_users, handlers::users::create_user,
        handlers::users::update_user_role, handlers::users::reset_password,
        handlers::users::delete_user,
        handlers::board::list_posts, handlers::board::get_post, handlers::board::list_comments,
        handlers::board::create_post, handlers::board::update_post, handlers::board::delete_post,
        handlers::board::add_comment, handlers::board::delete_comment,
        handlers::board::admin_list_posts, handlers::board::set_post_visibility,
        handlers::site::list_site_content, handlers::site::get_site_content,
        handlers::site::put_site_content, handlers::site::delete_site_content,
        handlers::upload::upload_image, handlers::stats::get_admin_stats
    ),
    components(
        schemas(
            models::Role, models::UserSummary, models::LoginRequest, models::LoginResponse,
            models::MessageResponse, models::SessionUser, models::SessionResponse,
            models::RegisterRequest, models::CreateUserRequest, models::UpdateRoleRequest,
            models::ChangePasswordRequest, models::ResetPasswordRequest,
            models::Post, models::CreatePostRequest, models::UpdatePostRequest,
            models::VisibilityRequest, models::PostPage, models::Comment,
            models::CreateCommentRequest, models::AdminDashboardStats, models::UploadResponse,
            content::OrderEntry,
            content::Pastor, content::PastorInput, content::PastorPatch,
            content::Event, content::EventInput, content::EventPatch,
            content::MinistryTeam, content::MinistryTeamInput, content::MinistryTeamPatch,
            content::Community, content::CommunityInput, content::CommunityPatch,
            content::FamilyProgram, content::FamilyProgramInput, content::FamilyProgramPatch,
            site_content::SiteContentKey, site_content::SiteContentBody, site_content::SiteContent,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "church-portal", description = "Church website content and community API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Single shared container for every service a handler may need. Cloning is cheap: each
/// field is an `Arc` or small configuration value.
#[derive(Clone)]
pub struct AppState {
    /// Users, board, site content and stats.
    pub repo: RepositoryState,
    /// One repository per ordered content entity.
    pub content: ContentStores,
    pub sessions: SessionState,
    /// Where uploaded images go.
    pub storage: StorageState,
    /// Login attempt counter shared by every login request.
    pub throttle: Arc<LoginThrottle>,
    pub config: AppConfig,
}

impl AppState {
    /// Fully in-memory state: nothing survives a restart. Used when no database is
    /// configured and by the integration tests.
    pub fn in_memory(config: AppConfig, storage: StorageState) -> Self {
        let backend = Arc::new(InMemoryRepository::new());
        Self {
            repo: Arc::clone(&backend) as RepositoryState,
            content: ContentStores::from_backend(backend),
            sessions: Arc::new(InMemorySessionStore::new(config.session_ttl_days)),
            storage,
            throttle: Arc::new(LoginThrottle::from_config(&config)),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// require_auth
///
/// Gate for `authenticated_routes`: the `AuthUser` extractor rejects the request with
/// 401 before the handler runs when the session cookie is missing, unknown or expired.
async fn require_auth(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// require_admin
///
/// Gate for everything under `/api/admin`: 401 without a session, 403 for non-admins.
async fn require_admin(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies the access layers per router and wraps the whole
/// application in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let uploads = ServeDir::new(&state.config.upload_dir);

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        .nest(
            "/api/admin",
            admin::admin_routes(&state.config)
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        // Uploaded images, served straight from disk.
        .nest_service(storage::PUBLIC_PREFIX, uploads)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span per request carrying the `x-request-id` set by `SetRequestIdLayer`, so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
