use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AdminUser, hash_password, validate_new_password},
    error::{AppError, AppJson, ErrorBody},
    handlers::required,
    models::{
        CreateUserRequest, MessageResponse, NewUser, ResetPasswordRequest, Role,
        UpdateRoleRequest, UserSummary,
    },
    repository::normalize_email,
};

/// Validates account fields shared by self-registration and admin creation and hashes
/// the password.
pub(crate) fn new_account(
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<NewUser, AppError> {
    let name = required(name, "이름")?;
    let email = normalize_email(email);
    if !email.contains('@') {
        return Err(AppError::invalid("올바른 이메일 주소를 입력해주세요."));
    }
    validate_new_password(password)?;

    Ok(NewUser {
        name,
        email,
        password_hash: hash_password(password)?,
        role,
    })
}

/// list_users
///
/// [Admin Route] Every account, oldest first. Password hashes never leave the server.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users", body = [UserSummary]),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

/// create_user
///
/// [Admin Route] Creates an account with a chosen role.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserSummary),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let account = new_account(
        &payload.name,
        &payload.email,
        &payload.password,
        payload.role,
    )?;
    let user = state.repo.create_user(account).await?;
    tracing::info!(admin_id = %admin.id, user_id = %user.id, role = %user.role, "admin created user");
    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

/// update_user_role
///
/// [Admin Route] Promotes or demotes a user. Demoting the last admin fails with 400 and
/// changes nothing. A changed role revokes the user's sessions so the old role cannot be
/// used any more.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = UserSummary),
        (status = 400, description = "Would remove the last admin", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn update_user_role(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<UserSummary>, AppError> {
    let change = state.repo.update_user_role(id, payload.role).await?;

    if change.changed() {
        tracing::info!(
            admin_id = %admin.id,
            user_id = %id,
            from = %change.previous,
            to = %change.user.role,
            "user role changed"
        );
        revoke_sessions(&state, id).await;
    }
    Ok(Json(UserSummary::from(&change.user)))
}

/// Drops every session of `user_id` after a committed change to the account. The change
/// stands either way, so a failing store is logged rather than reported to the caller.
async fn revoke_sessions(state: &AppState, user_id: Uuid) {
    match state.sessions.delete_for_user(user_id, None).await {
        Ok(revoked) => tracing::info!(user_id = %user_id, revoked, "sessions revoked"),
        Err(err) => {
            tracing::error!(user_id = %user_id, error = %err, "failed to revoke sessions")
        }
    }
}

/// reset_password
///
/// [Admin Route] Sets a new password for a user and logs them out everywhere.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Weak password", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn reset_password(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_new_password(&payload.new_password)?;
    let hash = hash_password(&payload.new_password)?;

    if !state.repo.update_password(id, &hash).await? {
        return Err(AppError::not_found("사용자"));
    }
    tracing::info!(admin_id = %admin.id, user_id = %id, "admin reset password");
    revoke_sessions(&state, id).await;

    Ok(Json(MessageResponse::new("비밀번호가 재설정되었습니다.")))
}

/// delete_user
///
/// [Admin Route] Deletes an account under the last-admin guard. The user's posts and
/// comments remain with no author.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Would remove the last admin", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_user(id).await?;
    tracing::info!(admin_id = %admin.id, user_id = %id, "user deleted");
    revoke_sessions(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}
