use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    api::models::{AdminStatsDto, LogEntryDto},
    dto::{admin::LogExportResponse, common::ActionResponse},
    error::AppError,
    services::admin_service,
    state::SharedState,
};

/// Admin dashboard routes. The backend decides who may use them.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/logs", get(logs).delete(purge_logs))
        .route("/admin/logs/export", post(export_logs))
}

#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminStatsDto),
        (status = 403, description = "The user is not an administrator")
    )
)]
pub async fn stats(State(state): State<SharedState>) -> Result<Json<AdminStatsDto>, AppError> {
    Ok(Json(admin_service::stats(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/logs",
    tag = "admin",
    responses((status = 200, description = "Backend log entries", body = [LogEntryDto]))
)]
pub async fn logs(State(state): State<SharedState>) -> Result<Json<Vec<LogEntryDto>>, AppError> {
    Ok(Json(admin_service::logs(&state).await?))
}

/// Write the backend log export to a timestamped file.
#[utoipa::path(
    post,
    path = "/admin/logs/export",
    tag = "admin",
    responses((status = 200, description = "Export written", body = LogExportResponse))
)]
pub async fn export_logs(
    State(state): State<SharedState>,
) -> Result<Json<LogExportResponse>, AppError> {
    Ok(Json(admin_service::export_logs(&state).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/logs",
    tag = "admin",
    responses((status = 200, description = "Logs purged", body = ActionResponse))
)]
pub async fn purge_logs(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::purge_logs(&state).await?))
}
