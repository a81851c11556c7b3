use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppJson, ErrorBody},
    handlers::required,
    models::{
        Comment, CreateCommentRequest, CreatePostRequest, Post, PostPage, PostQuery,
        UpdatePostRequest, VisibilityRequest,
    },
};

const POST: &str = "게시글";
const COMMENT: &str = "댓글";

/// Loads a post for a mutation and checks the caller may touch it: its author or an admin.
async fn load_owned_post(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Post, AppError> {
    let post = state
        .repo
        .get_post(id, true)
        .await?
        .ok_or_else(|| AppError::not_found(POST))?;

    if post.author_id != Some(user.id) && !user.is_admin() {
        tracing::warn!(user_id = %user.id, post_id = %id, "non-author attempted to modify post");
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

// --- Public ---

/// list_posts
///
/// [Public Route] Visible board posts, newest first, with optional search and paging.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostQuery),
    responses((status = 200, description = "One page of posts", body = PostPage))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<PostPage>, AppError> {
    Ok(Json(state.repo.list_posts(&query, false).await?))
}

/// get_post
///
/// [Public Route] One visible post. Each call counts as a view.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Missing or hidden", body = ErrorBody)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, AppError> {
    state
        .repo
        .record_post_view(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(POST))
}

/// list_comments
///
/// [Public Route] Comments of a visible post, oldest first.
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Missing or hidden post", body = ErrorBody)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, AppError> {
    if state.repo.get_post(id, false).await?.is_none() {
        return Err(AppError::not_found(POST));
    }
    Ok(Json(state.repo.list_comments(id).await?))
}

// --- Authenticated ---

/// create_post
///
/// [Authenticated Route] Writes a new board post as the caller.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Missing title or content", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let req = CreatePostRequest {
        title: required(&payload.title, "제목")?,
        content: required(&payload.content, "내용")?,
    };
    let post = state.repo.create_post(user.id, req).await?;
    tracing::info!(user_id = %user.id, post_id = %post.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Author or admin only; others get 403.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    load_owned_post(&state, &user, id).await?;

    let req = UpdatePostRequest {
        title: payload
            .title
            .as_deref()
            .map(|title| required(title, "제목"))
            .transpose()?,
        content: payload
            .content
            .as_deref()
            .map(|content| required(content, "내용"))
            .transpose()?,
    };

    state
        .repo
        .update_post(id, req)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(POST))
}

/// delete_post
///
/// [Authenticated Route] Author or admin only. Comments go with the post.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    load_owned_post(&state, &user, id).await?;

    if !state.repo.delete_post(id).await? {
        return Err(AppError::not_found(POST));
    }
    tracing::info!(user_id = %user.id, post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// add_comment
///
/// [Authenticated Route] Comments on a visible post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 404, description = "Missing or hidden post", body = ErrorBody)
    )
)]
pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let content = required(&payload.content, "댓글 내용")?;
    let comment = state.repo.add_comment(post_id, user.id, content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// delete_comment
///
/// [Authenticated Route] Authors delete their own comments; admins delete any. A comment
/// the caller does not own answers 404, same as a missing one.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or not the author", body = ErrorBody)
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = if user.is_admin() {
        state.repo.delete_comment_admin(id).await?
    } else {
        state.repo.delete_comment(id, user.id).await?
    };

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(COMMENT))
    }
}

// --- Admin ---

/// admin_list_posts
///
/// [Admin Route] Board listing including hidden posts.
#[utoipa::path(
    get,
    path = "/api/admin/posts",
    params(PostQuery),
    responses((status = 200, description = "One page of posts", body = PostPage))
)]
pub async fn admin_list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<PostPage>, AppError> {
    Ok(Json(state.repo.list_posts(&query, true).await?))
}

/// set_post_visibility
///
/// [Admin Route] Moderation: hides or re-publishes a post.
#[utoipa::path(
    put,
    path = "/api/admin/posts/{id}/visibility",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn set_post_visibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<VisibilityRequest>,
) -> Result<Json<Post>, AppError> {
    let post = state
        .repo
        .set_post_visibility(id, payload.is_active)
        .await?
        .ok_or_else(|| AppError::not_found(POST))?;
    tracing::info!(post_id = %id, is_active = payload.is_active, "post visibility changed");
    Ok(Json(post))
}
