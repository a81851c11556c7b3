use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::{
    AppState,
    auth::{
        AuthUser, clear_cookie, hash_password, session_cookie, session_token,
        validate_new_password, verify_dummy_password, verify_password,
    },
    error::{AppError, AppJson, ErrorBody},
    handlers::users::new_account,
    models::{
        ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
        Role, SessionResponse, UserSummary,
    },
    repository::normalize_email,
};

/// login
///
/// [Public Route] Verifies email + password and opens a session.
///
/// Every attempt counts against the throttle before any lookup. Unknown email and wrong
/// password produce the same `InvalidCredentials` answer after the same Argon2 work. On success the session token is returned only as an
/// HTTP-only cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; sets the sessionId cookie", body = LoginResponse),
        (status = 400, description = "Missing fields or invalid credentials", body = ErrorBody),
        (status = 429, description = "Too many failed attempts", body = ErrorBody)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::invalid("이메일과 비밀번호를 입력해주세요."));
    }

    state.throttle.attempt(&email).await?;

    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        verify_dummy_password(&payload.password);
        tracing::info!("login failed: unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "login failed: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    state.throttle.reset(&email).await;
    let session = state.sessions.create(&user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token, &state.config))],
        Json(LoginResponse {
            user: UserSummary::from(&user),
        }),
    ))
}

/// logout
///
/// [Public Route] Drops the server-side session named by the cookie, if any, and tells
/// the browser to forget the cookie. Always succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out; clears the sessionId cookie", body = MessageResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        state.sessions.delete(&token).await?;
    }
    Ok((
        [(header::SET_COOKIE, clear_cookie(&state.config))],
        Json(MessageResponse::new("로그아웃되었습니다.")),
    ))
}

/// get_session
///
/// [Public Route] Who is logged in. 401 when there is no valid session.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn get_session(user: AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        is_admin: user.is_admin(),
        user: user.user(),
    })
}

/// register
///
/// [Public Route] Creates a regular member account. Does not log the new user in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserSummary),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let account = new_account(&payload.name, &payload.email, &payload.password, Role::User)?;
    let user = state.repo.create_user(account).await?;
    tracing::info!(user_id = %user.id, "member registered");
    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

/// change_password
///
/// [Authenticated Route] Changes the caller's own password. Every other session of the
/// user is revoked; the one making this request stays valid.
#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or weak new password", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let stored = state
        .repo
        .get_user(user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&payload.current_password, &stored.password_hash)? {
        return Err(AppError::invalid("현재 비밀번호가 올바르지 않습니다."));
    }
    validate_new_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    state.repo.update_password(user.id, &hash).await?;
    let revoked = state
        .sessions
        .delete_for_user(user.id, Some(&user.token))
        .await?;
    tracing::info!(revoked, "password changed");

    Ok(Json(MessageResponse::new("비밀번호가 변경되었습니다.")))
}
