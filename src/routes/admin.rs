use crate::{
    AppState,
    config::AppConfig,
    content::{Community, ContentEntity, Event, FamilyProgram, MinistryTeam, Pastor},
    handlers::{board, content, site, stats, upload, users},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Admin Router Module
///
/// Everything the admin panel calls. Nested under `/api/admin` and wrapped in the
/// `require_admin` layer, so a non-admin session never reaches a handler here.
pub fn admin_routes(config: &AppConfig) -> Router<AppState> {
    let router = Router::new()
        // --- Accounts ---
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", delete(users::delete_user))
        // PUT /users/{id}/role
        // Guarded: the last admin can be neither demoted nor deleted.
        .route("/users/{id}/role", put(users::update_user_role))
        .route("/users/{id}/password", put(users::reset_password))
        // --- Board moderation ---
        .route("/posts", get(board::admin_list_posts))
        .route("/posts/{id}/visibility", put(board::set_post_visibility))
        // --- Site-wide blocks ---
        .route(
            "/site-content/{key}",
            put(site::put_site_content).delete(site::delete_site_content),
        )
        // POST /upload
        // The body limit is route-local so the rest of the API keeps axum's default.
        .route(
            "/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(
                config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/stats", get(stats::get_admin_stats));

    let router = content_routes::<Pastor>(router);
    let router = content_routes::<Event>(router);
    let router = content_routes::<MinistryTeam>(router);
    let router = content_routes::<Community>(router);
    content_routes::<FamilyProgram>(router)
}

/// GET/POST /{kind}, PUT /{kind}/order, PUT/DELETE /{kind}/{id}
fn content_routes<T: ContentEntity>(router: Router<AppState>) -> Router<AppState> {
    let base = format!("/{}", T::SLUG);
    router
        .route(
            &base,
            get(content::list_all::<T>).post(content::create::<T>),
        )
        .route(&format!("{base}/order"), put(content::reorder::<T>))
        .route(
            &format!("{base}/{{id}}"),
            put(content::update::<T>).delete(content::delete::<T>),
        )
}
