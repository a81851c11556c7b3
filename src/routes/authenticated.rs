use crate::{
    AppState,
    handlers::{auth, board},
};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Authenticated Router Module
///
/// Routes for any logged-in member. `create_router` wraps this router in the
/// `require_auth` layer; handlers still take `AuthUser` to know who is calling.
/// Ownership of posts and comments is decided in the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // PUT /api/auth/password
        // Own password change; other sessions of the user are revoked.
        .route("/api/auth/password", put(auth::change_password))
        // --- Community board ---
        .route("/api/posts", post(board::create_post))
        // PUT/DELETE /api/posts/{id}
        // Author or admin only.
        .route(
            "/api/posts/{id}",
            put(board::update_post).delete(board::delete_post),
        )
        .route("/api/posts/{id}/comments", post(board::add_comment))
        // DELETE /api/comments/{id}
        // Authors delete their own comments, admins any.
        .route("/api/comments/{id}", delete(board::delete_comment))
}
