//! Generic handlers for the ordered content entities.
//!
//! One set of functions serves pastors, events, ministries, communities and family
//! programs; the router instantiates them per entity (`list_active::<Pastor>`, ...).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::collections::HashSet;

use crate::{
    AppState,
    content::{ContentEntity, OrderEntry},
    error::{AppError, AppJson},
};

/// [Public Route] Active rows, `order` ascending.
pub async fn list_active<T: ContentEntity>(
    State(state): State<AppState>,
) -> Result<Json<Vec<T>>, AppError> {
    Ok(Json(T::store(&state.content).list(true).await?))
}

/// [Public Route] One active row; inactive rows are indistinguishable from missing ones.
pub async fn get_active<T: ContentEntity>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<T>, AppError> {
    T::store(&state.content)
        .get(id, true)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(T::LABEL))
}

/// [Admin Route] Every row, including inactive ones.
pub async fn list_all<T: ContentEntity>(
    State(state): State<AppState>,
) -> Result<Json<Vec<T>>, AppError> {
    Ok(Json(T::store(&state.content).list(false).await?))
}

pub async fn create<T: ContentEntity>(
    State(state): State<AppState>,
    AppJson(payload): AppJson<T::Create>,
) -> Result<(StatusCode, Json<T>), AppError> {
    let row = T::store(&state.content).create(payload).await?;
    tracing::info!(kind = T::SLUG, id = row.id(), "content created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// Partial update; fields left out of the body keep their value.
pub async fn update<T: ContentEntity>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<T::Update>,
) -> Result<Json<T>, AppError> {
    let row = T::store(&state.content)
        .update(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(T::LABEL))?;
    tracing::info!(kind = T::SLUG, id, "content updated");
    Ok(Json(row))
}

pub async fn delete<T: ContentEntity>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !T::store(&state.content).delete(id).await? {
        return Err(AppError::not_found(T::LABEL));
    }
    tracing::info!(kind = T::SLUG, id, "content deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// [Admin Route] Bulk `[{id, order}]` update, applied all-or-nothing. Returns the full
/// list in its new order.
pub async fn reorder<T: ContentEntity>(
    State(state): State<AppState>,
    AppJson(entries): AppJson<Vec<OrderEntry>>,
) -> Result<Json<Vec<T>>, AppError> {
    let mut seen = HashSet::new();
    if !entries.iter().all(|entry| seen.insert(entry.id)) {
        return Err(AppError::invalid("같은 항목이 두 번 포함되어 있습니다."));
    }

    let rows = T::store(&state.content).reorder(entries).await?;
    tracing::info!(kind = T::SLUG, count = seen.len(), "content reordered");
    Ok(Json(rows))
}
