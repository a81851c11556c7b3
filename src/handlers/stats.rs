use axum::{Json, extract::State};

use crate::{AppState, error::AppError, models::AdminDashboardStats};

/// get_admin_stats
///
/// [Admin Route] Dashboard counters: users, admins, posts, hidden posts, comments.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, AppError> {
    Ok(Json(state.repo.get_stats().await?))
}
