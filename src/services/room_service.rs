//! Room lifecycle: create, join, list, inspect, start and delete.
//!
//! Every write is followed by a fresh read of the room so the caller always sees the backend's
//! version of it.

use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    api::models::{RoomDto, RoomId},
    dto::{
        common::ActionResponse,
        rooms::{CreateRoomBody, JoinRoomBody, RoomView},
    },
    error::ServiceError,
    state::{SharedState, UserSession, teams::ROSTER_SIZE},
};

/// Create a room. The call is bounded by the configured room creation timeout and is never
/// retried automatically.
pub async fn create_room(
    state: &SharedState,
    payload: CreateRoomBody,
) -> Result<RoomView, ServiceError> {
    let user = state.current_user().await?;
    let limit = state.config().room_creation_timeout();

    let room = match timeout(limit, state.backend().create_room(payload.into())).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(after = ?limit, "room creation timed out");
            return Err(ServiceError::Timeout);
        }
    };

    info!(room = %room.id, "room created");
    Ok(RoomView::for_user(room, &user.user_id))
}

/// Join a room with its invitation code.
pub async fn join_room(
    state: &SharedState,
    payload: JoinRoomBody,
) -> Result<RoomView, ServiceError> {
    let user = state.current_user().await?;
    let joined = state.backend().join_room(payload.into()).await?;
    info!(room = %joined.id, "joined room");

    let room = refetch_or(state, joined).await;
    Ok(RoomView::for_user(room, &user.user_id))
}

pub async fn list_rooms(state: &SharedState) -> Result<Vec<RoomView>, ServiceError> {
    let user = state.current_user().await?;
    let rooms = state.backend().list_rooms().await?;
    Ok(rooms
        .into_iter()
        .map(|room| RoomView::for_user(room, &user.user_id))
        .collect())
}

pub async fn get_room(state: &SharedState, id: RoomId) -> Result<RoomView, ServiceError> {
    let user = state.current_user().await?;
    let room = state.backend().fetch_room(id).await?;
    Ok(RoomView::for_user(room, &user.user_id))
}

/// Start the match once the creator has four entrants split in two teams.
pub async fn start_match(state: &SharedState, id: RoomId) -> Result<RoomView, ServiceError> {
    let user = state.current_user().await?;
    let room = state.backend().fetch_room(id.clone()).await?;
    ensure_creator(&room, &user, "Solo el creador de la sala puede iniciar el partido")?;

    let assigned = room
        .entrants
        .iter()
        .filter(|entrant| entrant.team.is_some())
        .count();
    if room.entrants.len() != ROSTER_SIZE || assigned != ROSTER_SIZE {
        return Err(ServiceError::InvalidState(
            "Ambos equipos deben tener 2 jugadores".into(),
        ));
    }

    state.backend().start_match(id).await?;
    info!(room = %room.id, "match started");

    let room = refetch_or(state, room).await;
    Ok(RoomView::for_user(room, &user.user_id))
}

/// Delete a room and drop any local state kept for it.
pub async fn delete_room(state: &SharedState, id: RoomId) -> Result<ActionResponse, ServiceError> {
    state.current_user().await?;
    state.backend().delete_room(id.clone()).await?;
    state.forget_room(&id);
    info!(room = %id, "room deleted");
    Ok(ActionResponse::new(format!("room {id} deleted")))
}

/// Reject the operation unless `user` created `room`.
pub(crate) fn ensure_creator(
    room: &RoomDto,
    user: &UserSession,
    message: &str,
) -> Result<(), ServiceError> {
    if room.creator_id == user.user_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(message.into()))
    }
}

/// Re-read a room after a write, keeping `fallback` when the read fails.
pub(crate) async fn refetch_or(state: &SharedState, fallback: RoomDto) -> RoomDto {
    match state.backend().fetch_room(fallback.id.clone()).await {
        Ok(room) => room,
        Err(err) => {
            warn!(room = %fallback.id, error = %err, "failed to refresh room after write");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        api::{
            auth::TokenStore,
            error::ErrorCategory,
            fake::{FakeBackend, room},
        },
        config::AppConfig,
        state::{
            AppState,
            test_support::{signed_in, signed_in_with},
        },
    };

    fn create_body() -> CreateRoomBody {
        CreateRoomBody {
            name: "Martes 19hs".into(),
            scheduled_at: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn room_creation_times_out_with_network_error() {
        let backend = Arc::new(FakeBackend::default());
        *backend.create_delay.lock().unwrap() = Some(Duration::from_secs(60));
        let config = AppConfig::default().with_room_creation_timeout(Duration::from_millis(20));
        let state = signed_in_with(backend.clone(), "me", config).await;

        let err = create_room(&state, create_body()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Timeout));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(backend.calls_to("create_room"), 1);
    }

    #[tokio::test]
    async fn room_creation_returns_creator_view() {
        let backend = Arc::new(FakeBackend::default());
        let state = signed_in(backend, "me").await;

        let view = create_room(&state, create_body()).await.unwrap();

        assert_eq!(view.room.name, "Martes 19hs");
        assert!(view.is_creator);
    }

    #[tokio::test]
    async fn signed_out_user_cannot_list_rooms() {
        let backend = Arc::new(FakeBackend::default());
        let state = AppState::new(backend.clone(), Arc::new(TokenStore::new()), AppConfig::default());

        let err = list_rooms(&state).await.unwrap_err();

        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(backend.calls_to("list_rooms"), 0);
    }

    #[tokio::test]
    async fn only_creator_starts_a_match() {
        let backend = Arc::new(FakeBackend::with_room(room(
            "r1",
            "creator",
            &[("creator", None), ("b", None), ("c", None), ("d", None)],
        )));
        let state = signed_in(backend.clone(), "b").await;

        let err = start_match(&state, RoomId::new("r1")).await.unwrap_err();

        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(backend.calls_to("start_match"), 0);
    }

    #[tokio::test]
    async fn start_requires_assigned_teams() {
        let backend = Arc::new(FakeBackend::with_room(room(
            "r1",
            "creator",
            &[("creator", None), ("b", None), ("c", None), ("d", None)],
        )));
        let state = signed_in(backend.clone(), "creator").await;

        let err = start_match(&state, RoomId::new("r1")).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(backend.calls_to("start_match"), 0);
    }

    #[tokio::test]
    async fn delete_drops_local_state() {
        let backend = Arc::new(FakeBackend::with_room(room("r1", "creator", &[])));
        let state = signed_in(backend, "creator").await;
        state
            .scoreboards()
            .insert(RoomId::new("r1"), Default::default());

        delete_room(&state, RoomId::new("r1")).await.unwrap();

        assert!(state.scoreboards().is_empty());
    }
}
