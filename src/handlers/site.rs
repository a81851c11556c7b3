use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState,
    error::{AppError, AppJson, ErrorBody},
    site_content::{SiteContent, SiteContentBody, SiteContentKey},
};

const BLOCK: &str = "콘텐츠";

/// list_site_content
///
/// [Public Route] Every stored content block.
#[utoipa::path(
    get,
    path = "/api/site-content",
    responses((status = 200, description = "All blocks", body = [SiteContent]))
)]
pub async fn list_site_content(
    State(state): State<AppState>,
) -> Result<Json<Vec<SiteContent>>, AppError> {
    Ok(Json(state.repo.list_site_content().await?))
}

/// get_site_content
///
/// [Public Route] One block by key (`hero`, `greeting`, `vision`, `worship_times`,
/// `contact`, `history`). Unknown keys are a 400, unset known keys a 404.
#[utoipa::path(
    get,
    path = "/api/site-content/{key}",
    params(("key" = SiteContentKey, Path, description = "Content key")),
    responses(
        (status = 200, description = "Found", body = SiteContent),
        (status = 400, description = "Unknown key", body = ErrorBody),
        (status = 404, description = "Not set yet", body = ErrorBody)
    )
)]
pub async fn get_site_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SiteContent>, AppError> {
    let key: SiteContentKey = key.parse()?;
    state
        .repo
        .get_site_content(key)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(BLOCK))
}

/// put_site_content
///
/// [Admin Route] Replaces a block. The body is the block's content object, which must
/// match the shape of its key exactly; anything else is rejected with 400.
#[utoipa::path(
    put,
    path = "/api/admin/site-content/{key}",
    params(("key" = SiteContentKey, Path, description = "Content key")),
    responses(
        (status = 200, description = "Stored", body = SiteContent),
        (status = 400, description = "Unknown key or wrong shape", body = ErrorBody)
    )
)]
pub async fn put_site_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
    AppJson(content): AppJson<Value>,
) -> Result<Json<SiteContent>, AppError> {
    let key: SiteContentKey = key.parse()?;
    let body = SiteContentBody::from_parts(key, content).map_err(|e| {
        AppError::invalid(format!("'{key}' 콘텐츠 형식이 올바르지 않습니다: {e}"))
    })?;

    let block = state.repo.upsert_site_content(body).await?;
    tracing::info!(key = %key, "site content updated");
    Ok(Json(block))
}

/// delete_site_content
///
/// [Admin Route] Removes a block; the front-end falls back to its built-in default.
#[utoipa::path(
    delete,
    path = "/api/admin/site-content/{key}",
    params(("key" = SiteContentKey, Path, description = "Content key")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not set", body = ErrorBody)
    )
)]
pub async fn delete_site_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    let key: SiteContentKey = key.parse()?;
    if !state.repo.delete_site_content(key).await? {
        return Err(AppError::not_found(BLOCK));
    }
    tracing::info!(key = %key, "site content deleted");
    Ok(StatusCode::NO_CONTENT)
}
