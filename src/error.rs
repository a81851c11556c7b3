use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// AppError
///
/// The single error type returned by every handler. Each variant maps to exactly one
/// HTTP status, and the response body is always `{ "error": "<message>" }`.
/// Messages are user-facing (Korean), except for `Internal`, whose cause is only logged.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No session cookie, or the session is unknown/expired.
    #[error("로그인이 필요합니다.")]
    Unauthorized,

    /// Authenticated, but the role or ownership does not allow the action.
    #[error("권한이 없습니다.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("이메일 또는 비밀번호가 올바르지 않습니다.")]
    InvalidCredentials,

    /// The mutation would leave the site without any administrator.
    #[error("최소 한 명의 관리자가 필요합니다.")]
    LastAdmin,

    #[error("{0}")]
    Conflict(String),

    #[error("로그인 시도가 너무 많습니다. 잠시 후 다시 시도해주세요.")]
    TooManyRequests,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what}을(를) 찾을 수 없습니다."))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) | Self::InvalidCredentials | Self::LastAdmin => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ErrorBody
///
/// Wire shape of every error response.
#[derive(Debug, Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                "서버 오류가 발생했습니다.".to_string()
            }
            other => other.to_string(),
        };

        (status, axum::Json(ErrorBody { error: message })).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict("이미 존재하는 항목입니다.".into())
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::InvalidRequest("입력값이 올바르지 않습니다.".into())
            }
            _ => {
                tracing::error!(error = %err, "database error");
                Self::Internal(err.into())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected JSON body");
        Self::InvalidRequest(format!("잘못된 요청 형식입니다: {}", rejection.body_text()))
    }
}

/// AppJson
///
/// Drop-in replacement for `axum::Json` whose rejection is an `AppError`, so malformed
/// bodies answer 400 with the standard JSON error shape instead of axum's plain text.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
