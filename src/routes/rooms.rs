use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    api::models::RoomId,
    dto::{
        common::ActionResponse,
        rooms::{CreateRoomBody, JoinRoomBody, RoomView, WatchView},
    },
    error::AppError,
    services::{room_service, room_watcher},
    state::SharedState,
};

/// Room lifecycle and room watcher routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/join", post(join_room))
        .route("/rooms/{id}", get(get_room).delete(delete_room))
        .route("/rooms/{id}/start", post(start_match))
        .route(
            "/rooms/{id}/watch",
            post(start_watching).get(watch_state).delete(stop_watching),
        )
}

#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    responses((status = 200, description = "Rooms visible to the user", body = [RoomView]))
)]
pub async fn list_rooms(State(state): State<SharedState>) -> Result<Json<Vec<RoomView>>, AppError> {
    Ok(Json(room_service::list_rooms(&state).await?))
}

/// Open a new room. Fails with a network error when the backend does not answer in time.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomBody,
    responses(
        (status = 200, description = "Room created", body = RoomView),
        (status = 504, description = "Room creation timed out")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomBody>>,
) -> Result<Json<RoomView>, AppError> {
    Ok(Json(room_service::create_room(&state, payload).await?))
}

/// Join a room with its six-character invitation code.
#[utoipa::path(
    post,
    path = "/rooms/join",
    tag = "rooms",
    request_body = JoinRoomBody,
    responses((status = 200, description = "Room joined", body = RoomView))
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinRoomBody>>,
) -> Result<Json<RoomView>, AppError> {
    Ok(Json(room_service::join_room(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Room", body = RoomView))
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RoomView>, AppError> {
    Ok(Json(room_service::get_room(&state, RoomId::from(id)).await?))
}

#[utoipa::path(
    delete,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = String, Path, description = "Identifier of the room to delete")),
    responses((status = 200, description = "Room deleted", body = ActionResponse))
)]
pub async fn delete_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(room_service::delete_room(&state, RoomId::from(id)).await?))
}

/// Start the match once both teams are complete.
#[utoipa::path(
    post,
    path = "/rooms/{id}/start",
    tag = "rooms",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Match started", body = RoomView))
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RoomView>, AppError> {
    Ok(Json(room_service::start_match(&state, RoomId::from(id)).await?))
}

/// Start polling a room in the background.
#[utoipa::path(
    post,
    path = "/rooms/{id}/watch",
    tag = "rooms",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Watcher running", body = WatchView))
)]
pub async fn start_watching(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<WatchView>, AppError> {
    Ok(Json(
        room_watcher::start_watching(&state, RoomId::from(id)).await?,
    ))
}

/// Latest copy of a watched room.
#[utoipa::path(
    get,
    path = "/rooms/{id}/watch",
    tag = "rooms",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Latest snapshot", body = WatchView))
)]
pub async fn watch_state(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<WatchView>, AppError> {
    Ok(Json(room_watcher::latest(&state, RoomId::from(id)).await?))
}

#[utoipa::path(
    delete,
    path = "/rooms/{id}/watch",
    tag = "rooms",
    params(("id" = String, Path, description = "Identifier of the room")),
    responses((status = 200, description = "Watcher stopped", body = ActionResponse))
)]
pub async fn stop_watching(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        room_watcher::stop_watching(&state, RoomId::from(id)).await?,
    ))
}
