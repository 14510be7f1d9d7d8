use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};

use crate::{
    api::models::{EntrantId, RoomId},
    dto::{
        common::ActionResponse,
        rooms::RoomView,
        teams::{MoveEntrantRequest, PanelView},
    },
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Team assignment panel routes. Only the room creator may open a panel.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/rooms/{id}/teams",
            post(open_panel).get(get_panel).delete(close_panel),
        )
        .route(
            "/rooms/{id}/teams/entrants/{entrant}",
            put(move_entrant).delete(remove_entrant),
        )
        .route("/rooms/{id}/teams/auto", post(auto_assign))
        .route("/rooms/{id}/teams/submit", post(submit_panel))
}

/// Open the panel from the room's current roster.
#[utoipa::path(
    post,
    path = "/rooms/{id}/teams",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Panel opened", body = PanelView))
)]
pub async fn open_panel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PanelView>, AppError> {
    Ok(Json(team_service::open_panel(&state, RoomId::from(id)).await?))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}/teams",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Panel state", body = PanelView))
)]
pub async fn get_panel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PanelView>, AppError> {
    Ok(Json(team_service::get_panel(&state, RoomId::from(id)).await?))
}

/// Discard the panel and its edits.
#[utoipa::path(
    delete,
    path = "/rooms/{id}/teams",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Panel closed", body = ActionResponse))
)]
pub async fn close_panel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(team_service::close_panel(&state, RoomId::from(id)).await?))
}

/// Place an entrant in team A or B.
#[utoipa::path(
    put,
    path = "/rooms/{id}/teams/entrants/{entrant}",
    tag = "teams",
    params(
        ("id" = String, Path, description = "Identifier of the room"),
        ("entrant" = String, Path, description = "Identifier of the entrant to move")
    ),
    request_body = MoveEntrantRequest,
    responses(
        (status = 200, description = "Entrant moved", body = PanelView),
        (status = 400, description = "Target team is full")
    )
)]
pub async fn move_entrant(
    State(state): State<SharedState>,
    Path((id, entrant)): Path<(String, String)>,
    Json(payload): Json<MoveEntrantRequest>,
) -> Result<Json<PanelView>, AppError> {
    let view = team_service::move_entrant(
        &state,
        RoomId::from(id),
        EntrantId::from(entrant),
        payload.side,
    )
    .await?;
    Ok(Json(view))
}

/// Return an entrant to the unassigned pool.
#[utoipa::path(
    delete,
    path = "/rooms/{id}/teams/entrants/{entrant}",
    tag = "teams",
    params(
        ("id" = String, Path, description = "Identifier of the room"),
        ("entrant" = String, Path, description = "Identifier of the entrant to unassign")
    ),
    responses((status = 200, description = "Entrant unassigned", body = PanelView))
)]
pub async fn remove_entrant(
    State(state): State<SharedState>,
    Path((id, entrant)): Path<(String, String)>,
) -> Result<Json<PanelView>, AppError> {
    let view =
        team_service::remove_entrant(&state, RoomId::from(id), EntrantId::from(entrant)).await?;
    Ok(Json(view))
}

/// Split four entrants by rating (ranks 1 and 4 against ranks 2 and 3).
#[utoipa::path(
    post,
    path = "/rooms/{id}/teams/auto",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Teams assigned locally", body = PanelView),
        (status = 400, description = "Roster does not hold exactly four entrants")
    )
)]
pub async fn auto_assign(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PanelView>, AppError> {
    Ok(Json(team_service::auto_assign(&state, RoomId::from(id)).await?))
}

/// Send the assignment to the backend.
#[utoipa::path(
    post,
    path = "/rooms/{id}/teams/submit",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Teams saved; room re-read", body = RoomView),
        (status = 400, description = "A team is incomplete")
    )
)]
pub async fn submit_panel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RoomView>, AppError> {
    Ok(Json(team_service::submit_panel(&state, RoomId::from(id)).await?))
}
