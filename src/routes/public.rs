use crate::{
    AppState,
    content::{Community, ContentEntity, Event, FamilyProgram, MinistryTeam, Pastor},
    handlers::{auth, board, content, site},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to anonymous visitors. Every listing here filters out inactive content
/// and hidden posts at the repository level.
pub fn public_routes() -> Router<AppState> {
    let router = Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // --- Session gateway ---
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        // GET /api/auth/session
        // 401 without a valid cookie; the front-end uses it to decide what to render.
        .route("/api/auth/session", get(auth::get_session))
        .route("/api/auth/register", post(auth::register))
        // --- Site-wide blocks (hero, greeting, worship times, ...) ---
        .route("/api/site-content", get(site::list_site_content))
        .route("/api/site-content/{key}", get(site::get_site_content))
        // --- Community board ---
        .route("/api/posts", get(board::list_posts))
        // GET /api/posts/{id}
        // Counts a view on every call.
        .route("/api/posts/{id}", get(board::get_post))
        .route("/api/posts/{id}/comments", get(board::list_comments));

    // GET /api/{kind} and /api/{kind}/{id} for each ordered content page.
    let router = content_routes::<Pastor>(router);
    let router = content_routes::<Event>(router);
    let router = content_routes::<MinistryTeam>(router);
    let router = content_routes::<Community>(router);
    content_routes::<FamilyProgram>(router)
}

fn content_routes<T: ContentEntity>(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            &format!("/api/{}", T::SLUG),
            get(content::list_active::<T>),
        )
        .route(
            &format!("/api/{}/{{id}}", T::SLUG),
            get(content::get_active::<T>),
        )
}
