//! Team assignment panel actions. Edits stay local until the creator submits them.

use tracing::{debug, info};

use crate::{
    api::models::{EntrantId, RoomId},
    dto::{common::ActionResponse, rooms::RoomView, teams::PanelView},
    error::ServiceError,
    services::room_service::{ensure_creator, refetch_or},
    state::{
        SharedState,
        teams::{TeamAssignment, TeamSide},
    },
};

const CREATOR_ONLY: &str = "Solo el creador de la sala puede armar los equipos";

/// Open (or reopen) the panel for a room from its current roster.
pub async fn open_panel(state: &SharedState, room_id: RoomId) -> Result<PanelView, ServiceError> {
    let user = state.current_user().await?;
    let room = state.backend().fetch_room(room_id.clone()).await?;
    ensure_creator(&room, &user, CREATOR_ONLY)?;

    let panel = TeamAssignment::from_roster(room.entrants);
    let view = PanelView::new(room_id.clone(), &panel);
    state.panels().insert(room_id.clone(), panel);
    debug!(room = %room_id, "team panel opened");
    Ok(view)
}

pub async fn get_panel(state: &SharedState, room_id: RoomId) -> Result<PanelView, ServiceError> {
    state.current_user().await?;
    with_panel(state, &room_id, |_| Ok(()))
}

/// Place an entrant in a team.
pub async fn move_entrant(
    state: &SharedState,
    room_id: RoomId,
    entrant: EntrantId,
    side: TeamSide,
) -> Result<PanelView, ServiceError> {
    state.current_user().await?;
    with_panel(state, &room_id, |panel| Ok(panel.move_to(&entrant, side)?))
}

/// Return an entrant to the unassigned pool.
pub async fn remove_entrant(
    state: &SharedState,
    room_id: RoomId,
    entrant: EntrantId,
) -> Result<PanelView, ServiceError> {
    state.current_user().await?;
    with_panel(state, &room_id, |panel| Ok(panel.remove(&entrant)?))
}

/// Split the roster by rating with snake seeding.
pub async fn auto_assign(state: &SharedState, room_id: RoomId) -> Result<PanelView, ServiceError> {
    state.current_user().await?;
    with_panel(state, &room_id, |panel| Ok(panel.auto_assign()?))
}

/// Send the assignment to the backend and close the panel. Incomplete teams are rejected
/// before any network call.
pub async fn submit_panel(state: &SharedState, room_id: RoomId) -> Result<RoomView, ServiceError> {
    let user = state.current_user().await?;
    let request = {
        let panel = state.panels().get(&room_id).ok_or_else(|| panel_not_open(&room_id))?;
        panel.submission()?
    };

    let room = state.backend().fetch_room(room_id.clone()).await?;
    ensure_creator(&room, &user, CREATOR_ONLY)?;

    state
        .backend()
        .assign_teams(room_id.clone(), request)
        .await?;
    state.panels().remove(&room_id);
    info!(room = %room_id, "teams assigned");

    let room = refetch_or(state, room).await;
    Ok(RoomView::for_user(room, &user.user_id))
}

/// Discard local edits.
pub async fn close_panel(state: &SharedState, room_id: RoomId) -> Result<ActionResponse, ServiceError> {
    state.current_user().await?;
    state.panels().remove(&room_id);
    Ok(ActionResponse::new("team panel closed"))
}

fn with_panel<F>(state: &SharedState, room_id: &RoomId, edit: F) -> Result<PanelView, ServiceError>
where
    F: FnOnce(&mut TeamAssignment) -> Result<(), ServiceError>,
{
    let mut panel = state
        .panels()
        .get_mut(room_id)
        .ok_or_else(|| panel_not_open(room_id))?;
    edit(&mut panel)?;
    Ok(PanelView::new(room_id.clone(), &panel))
}

fn panel_not_open(room_id: &RoomId) -> ServiceError {
    ServiceError::NotFound(format!("no team panel is open for room {room_id}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        api::fake::{FakeBackend, room},
        state::test_support::signed_in,
    };

    fn four_player_room() -> FakeBackend {
        FakeBackend::with_room(room(
            "r1",
            "ana",
            &[
                ("ana", Some(1500.0)),
                ("beto", Some(1800.0)),
                ("caro", Some(1400.0)),
                ("dani", Some(1600.0)),
            ],
        ))
    }

    fn ids(view: &[crate::dto::teams::EntrantView]) -> Vec<&str> {
        view.iter().map(|entrant| entrant.id.as_str()).collect()
    }

    #[tokio::test]
    async fn auto_assign_then_submit() {
        let backend = Arc::new(four_player_room());
        let state = signed_in(backend.clone(), "ana").await;
        let room_id = RoomId::new("r1");

        open_panel(&state, room_id.clone()).await.unwrap();
        let view = auto_assign(&state, room_id.clone()).await.unwrap();
        assert_eq!(ids(&view.team_a), vec!["beto", "caro"]);
        assert_eq!(ids(&view.team_b), vec!["dani", "ana"]);
        assert!(view.complete);

        let room = submit_panel(&state, room_id.clone()).await.unwrap();

        let assignments = backend.assignments.lock().unwrap();
        assert_eq!(assignments.len(), 1);
        let sent = &assignments[0].1.assignments;
        assert_eq!(sent[&EntrantId::new("beto")], 1);
        assert_eq!(sent[&EntrantId::new("ana")], 2);
        assert!(room.room.entrants.iter().all(|entrant| entrant.team.is_some()));
        assert!(state.panels().get(&room_id).is_none());
    }

    #[tokio::test]
    async fn incomplete_panel_is_rejected_without_network() {
        let backend = Arc::new(four_player_room());
        let state = signed_in(backend.clone(), "ana").await;
        let room_id = RoomId::new("r1");

        open_panel(&state, room_id.clone()).await.unwrap();
        move_entrant(&state, room_id.clone(), EntrantId::new("ana"), TeamSide::A)
            .await
            .unwrap();

        let err = submit_panel(&state, room_id).await.unwrap_err();

        assert_eq!(err.to_string(), "Ambos equipos deben tener 2 jugadores");
        assert_eq!(backend.calls_to("assign_teams"), 0);
    }

    #[tokio::test]
    async fn full_team_rejects_third_member() {
        let backend = Arc::new(four_player_room());
        let state = signed_in(backend, "ana").await;
        let room_id = RoomId::new("r1");

        open_panel(&state, room_id.clone()).await.unwrap();
        for entrant in ["ana", "beto"] {
            move_entrant(&state, room_id.clone(), EntrantId::new(entrant), TeamSide::A)
                .await
                .unwrap();
        }

        let err = move_entrant(&state, room_id, EntrantId::new("caro"), TeamSide::A)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "El equipo ya tiene 2 jugadores");
    }

    #[tokio::test]
    async fn non_creator_cannot_open_panel() {
        let backend = Arc::new(four_player_room());
        let state = signed_in(backend, "beto").await;

        let err = open_panel(&state, RoomId::new("r1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn closing_discards_edits() {
        let backend = Arc::new(four_player_room());
        let state = signed_in(backend, "ana").await;
        let room_id = RoomId::new("r1");

        open_panel(&state, room_id.clone()).await.unwrap();
        auto_assign(&state, room_id.clone()).await.unwrap();
        close_panel(&state, room_id.clone()).await.unwrap();

        let reopened = open_panel(&state, room_id).await.unwrap();
        assert!(reopened.team_a.is_empty());
        assert_eq!(reopened.unassigned.len(), 4);
    }
}
