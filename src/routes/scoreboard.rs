use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post, put},
};
use axum_valid::Valid;

use crate::{
    api::models::RoomId,
    dto::{
        common::ActionResponse,
        scoreboard::{AddSetRequest, DisputeBody, ResultView, ScoreboardView, UpdateSetRequest},
    },
    error::AppError,
    services::result_service,
    state::SharedState,
};

/// Score entry and result confirmation routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/rooms/{id}/scoreboard",
            post(open_scoreboard)
                .get(get_scoreboard)
                .delete(close_scoreboard),
        )
        .route("/rooms/{id}/scoreboard/sets", post(add_third_set))
        .route("/rooms/{id}/scoreboard/sets/third", delete(remove_third_set))
        .route("/rooms/{id}/scoreboard/sets/{number}", put(update_set))
        .route("/rooms/{id}/result", post(submit_result).get(get_result))
        .route("/rooms/{id}/result/confirm", post(confirm_result))
        .route("/rooms/{id}/result/dispute", post(dispute_result))
}

/// Open the score entry, prefilled with a pending result if there is one.
#[utoipa::path(
    post,
    path = "/rooms/{id}/scoreboard",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Scoreboard opened", body = ScoreboardView))
)]
pub async fn open_scoreboard(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        result_service::open_scoreboard(&state, RoomId::from(id)).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}/scoreboard",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Scoreboard state", body = ScoreboardView))
)]
pub async fn get_scoreboard(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        result_service::get_scoreboard(&state, RoomId::from(id)).await?,
    ))
}

/// Discard local score edits.
#[utoipa::path(
    delete,
    path = "/rooms/{id}/scoreboard",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Scoreboard closed", body = ActionResponse))
)]
pub async fn close_scoreboard(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        result_service::close_scoreboard(&state, RoomId::from(id)).await?,
    ))
}

/// Enter the counts of one set.
#[utoipa::path(
    put,
    path = "/rooms/{id}/scoreboard/sets/{number}",
    tag = "results",
    params(
        ("id" = String, Path, description = "Identifier of the room"),
        ("number" = usize, Path, description = "Set number, starting at 1")
    ),
    request_body = UpdateSetRequest,
    responses((status = 200, description = "Set updated", body = ScoreboardView))
)]
pub async fn update_set(
    State(state): State<SharedState>,
    Path((id, number)): Path<(String, usize)>,
    Json(payload): Json<UpdateSetRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    let view = result_service::update_set(&state, RoomId::from(id), number, payload).await?;
    Ok(Json(view))
}

/// Add the deciding third set.
#[utoipa::path(
    post,
    path = "/rooms/{id}/scoreboard/sets",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    request_body = AddSetRequest,
    responses(
        (status = 200, description = "Third set added", body = ScoreboardView),
        (status = 400, description = "The match already has three sets")
    )
)]
pub async fn add_third_set(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<AddSetRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        result_service::add_third_set(&state, RoomId::from(id), payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/rooms/{id}/scoreboard/sets/third",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Third set removed", body = ScoreboardView))
)]
pub async fn remove_third_set(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        result_service::remove_third_set(&state, RoomId::from(id)).await?,
    ))
}

/// Submit the entered score for confirmation by the other side.
#[utoipa::path(
    post,
    path = "/rooms/{id}/result",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Result submitted", body = ScoreboardView),
        (status = 400, description = "No side won two sets"),
        (status = 403, description = "Only the room creator may submit")
    )
)]
pub async fn submit_result(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        result_service::submit_result(&state, RoomId::from(id)).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}/result",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Stored result and confirmation state", body = ResultView))
)]
pub async fn get_result(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResultView>, AppError> {
    Ok(Json(
        result_service::get_result(&state, RoomId::from(id)).await?,
    ))
}

/// Accept the submitted result.
#[utoipa::path(
    post,
    path = "/rooms/{id}/result/confirm",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Result confirmed", body = ResultView),
        (status = 403, description = "The creator cannot confirm their own result")
    )
)]
pub async fn confirm_result(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResultView>, AppError> {
    Ok(Json(
        result_service::confirm_result(&state, RoomId::from(id)).await?,
    ))
}

/// Reject the submitted result with a justification.
#[utoipa::path(
    post,
    path = "/rooms/{id}/result/dispute",
    tag = "results",
    params(("id" = String, Path, description = "Identifier of the room")),
    request_body = DisputeBody,
    responses((status = 200, description = "Result disputed", body = ResultView))
)]
pub async fn dispute_result(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<DisputeBody>>,
) -> Result<Json<ResultView>, AppError> {
    Ok(Json(
        result_service::dispute_result(&state, RoomId::from(id), payload).await?,
    ))
}
