//! Score entry and the confirmation workflow of a room's result.
//!
//! Scoreboard edits are local. Submitting, confirming and disputing go through
//! [`AppState::run_transition`](crate::state::AppState::run_transition): the confirmation state
//! only moves once the backend acknowledged the action, and the stored result is re-read
//! afterwards.

use tracing::{debug, info, warn};

use crate::{
    api::models::{DisputeRequest, MatchResultDto, RoomId},
    dto::{
        common::ActionResponse,
        scoreboard::{
            AddSetRequest, ConfirmationView, DisputeBody, ResultView, ScoreboardView,
            UpdateSetRequest,
        },
    },
    error::ServiceError,
    state::{
        SharedState, UserSession,
        confirmation::{ConfirmationEvent, ConfirmationMachine},
        scoreboard::{MAX_SETS, Scoreboard},
    },
};

/// Open the score entry for a room, prefilled with the stored result when there is one.
pub async fn open_scoreboard(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ScoreboardView, ServiceError> {
    let user = state.current_user().await?;
    let room = state.backend().fetch_room(room_id.clone()).await?;
    let result = state.backend().fetch_result(room_id.clone()).await?;

    let scoreboard = match &result {
        Some(result) => Scoreboard::from_sets(&result.sets),
        None => Scoreboard::new(),
    };
    let remote = result.map(|result| result.status);
    state
        .confirmations()
        .entry(room_id.clone())
        .and_modify(|machine| {
            machine.set_participants(room.entrant_ids());
            if let Some(status) = remote {
                machine.observe(status.into());
            }
        })
        .or_insert_with(|| {
            ConfirmationMachine::resume(room.creator_id.clone(), room.entrant_ids(), remote)
        });
    state.scoreboards().insert(room_id.clone(), scoreboard);
    debug!(room = %room_id, "scoreboard opened");

    scoreboard_view(state, &room_id, &user)
}

pub async fn get_scoreboard(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ScoreboardView, ServiceError> {
    let user = state.current_user().await?;
    scoreboard_view(state, &room_id, &user)
}

/// Replace the counts of set `number` (1-based).
pub async fn update_set(
    state: &SharedState,
    room_id: RoomId,
    number: usize,
    payload: UpdateSetRequest,
) -> Result<ScoreboardView, ServiceError> {
    let user = state.current_user().await?;
    let index = number
        .checked_sub(1)
        .filter(|index| *index < MAX_SETS)
        .ok_or_else(|| ServiceError::InvalidInput(format!("El set {number} no existe")))?;

    edit_scoreboard(state, &room_id, &user, |scoreboard| {
        scoreboard.update_set(index, payload.team_a, payload.team_b)?;
        Ok(())
    })?;
    scoreboard_view(state, &room_id, &user)
}

/// Add the deciding set, optionally as a super tie-break.
pub async fn add_third_set(
    state: &SharedState,
    room_id: RoomId,
    payload: AddSetRequest,
) -> Result<ScoreboardView, ServiceError> {
    let user = state.current_user().await?;
    edit_scoreboard(state, &room_id, &user, |scoreboard| {
        Ok(scoreboard.add_third_set(payload.super_tiebreak)?)
    })?;
    scoreboard_view(state, &room_id, &user)
}

pub async fn remove_third_set(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ScoreboardView, ServiceError> {
    let user = state.current_user().await?;
    edit_scoreboard(state, &room_id, &user, |scoreboard| {
        Ok(scoreboard.remove_third_set()?)
    })?;
    scoreboard_view(state, &room_id, &user)
}

/// Discard local score edits.
pub async fn close_scoreboard(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ActionResponse, ServiceError> {
    state.current_user().await?;
    state.scoreboards().remove(&room_id);
    Ok(ActionResponse::new("scoreboard closed"))
}

/// Submit the entered score. Only the creator may do so, and only when one side won two sets;
/// both checks happen before any network call.
pub async fn submit_result(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ScoreboardView, ServiceError> {
    let user = state.current_user().await?;
    ensure_can_edit(state, &room_id, &user)?;
    let payload = {
        let scoreboard = state
            .scoreboards()
            .get(&room_id)
            .ok_or_else(|| scoreboard_not_open(&room_id))?;
        scoreboard.submission()?
    };

    let backend = state.backend();
    let id = room_id.clone();
    let (_, next) = state
        .run_transition(
            &room_id,
            ConfirmationEvent::Submit {
                by: user.user_id.clone(),
            },
            move || async move { Ok(backend.submit_result(id, payload).await?) },
        )
        .await?;
    info!(room = %room_id, state = ?next, "result submitted");

    refresh_result(state, &room_id).await;
    scoreboard_view(state, &room_id, &user)
}

/// Stored result of a room with the user's options on it.
pub async fn get_result(state: &SharedState, room_id: RoomId) -> Result<ResultView, ServiceError> {
    let user = state.current_user().await?;
    ensure_machine(state, &room_id).await?;
    let result = state.backend().fetch_result(room_id.clone()).await?;
    observe(state, &room_id, result.as_ref());
    result_view(state, room_id, &user, result)
}

/// Accept the submitted result.
pub async fn confirm_result(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ResultView, ServiceError> {
    let user = state.current_user().await?;
    ensure_machine(state, &room_id).await?;

    let backend = state.backend();
    let id = room_id.clone();
    let (_, next) = state
        .run_transition(
            &room_id,
            ConfirmationEvent::Confirm {
                by: user.user_id.clone(),
            },
            move || async move { Ok(backend.confirm_result(id).await?) },
        )
        .await?;
    info!(room = %room_id, state = ?next, "result confirmed");

    let result = refresh_result(state, &room_id).await;
    result_view(state, room_id, &user, result)
}

/// Reject the submitted result with a justification.
pub async fn dispute_result(
    state: &SharedState,
    room_id: RoomId,
    payload: DisputeBody,
) -> Result<ResultView, ServiceError> {
    let user = state.current_user().await?;
    ensure_machine(state, &room_id).await?;

    let reason = payload.reason.trim().to_string();
    let backend = state.backend();
    let id = room_id.clone();
    let request = DisputeRequest {
        reason: reason.clone(),
    };
    let (_, next) = state
        .run_transition(
            &room_id,
            ConfirmationEvent::Dispute {
                by: user.user_id.clone(),
                reason,
            },
            move || async move { Ok(backend.dispute_result(id, request).await?) },
        )
        .await?;
    info!(room = %room_id, state = ?next, "result disputed");

    let result = refresh_result(state, &room_id).await;
    result_view(state, room_id, &user, result)
}

/// Load the confirmation machine of a room from the backend unless it is already tracked.
async fn ensure_machine(state: &SharedState, room_id: &RoomId) -> Result<(), ServiceError> {
    if state.confirmations().contains_key(room_id) {
        return Ok(());
    }

    let room = state.backend().fetch_room(room_id.clone()).await?;
    let result = state.backend().fetch_result(room_id.clone()).await?;
    state
        .confirmations()
        .entry(room_id.clone())
        .or_insert_with(|| {
            ConfirmationMachine::resume(
                room.creator_id.clone(),
                room.entrant_ids(),
                result.map(|result| result.status),
            )
        });
    Ok(())
}

/// Re-read the stored result after a write and fold its status in. Failures are only logged.
async fn refresh_result(state: &SharedState, room_id: &RoomId) -> Option<MatchResultDto> {
    match state.backend().fetch_result(room_id.clone()).await {
        Ok(result) => {
            observe(state, room_id, result.as_ref());
            result
        }
        Err(err) => {
            warn!(room = %room_id, error = %err, "failed to refresh result after write");
            None
        }
    }
}

fn observe(state: &SharedState, room_id: &RoomId, result: Option<&MatchResultDto>) {
    let Some(result) = result else {
        return;
    };
    if let Some(mut machine) = state.confirmations().get_mut(room_id) {
        if machine.observe(result.status.into()) {
            debug!(room = %room_id, state = ?machine.state(), "confirmation state advanced remotely");
        }
    }
}

fn ensure_can_edit(
    state: &SharedState,
    room_id: &RoomId,
    user: &UserSession,
) -> Result<(), ServiceError> {
    let machine = state
        .confirmations()
        .get(room_id)
        .ok_or_else(|| scoreboard_not_open(room_id))?;
    Ok(machine.ensure_can_edit(&user.user_id)?)
}

fn edit_scoreboard<F>(
    state: &SharedState,
    room_id: &RoomId,
    user: &UserSession,
    edit: F,
) -> Result<(), ServiceError>
where
    F: FnOnce(&mut Scoreboard) -> Result<(), ServiceError>,
{
    ensure_can_edit(state, room_id, user)?;
    let mut scoreboard = state
        .scoreboards()
        .get_mut(room_id)
        .ok_or_else(|| scoreboard_not_open(room_id))?;
    edit(&mut scoreboard)
}

fn scoreboard_view(
    state: &SharedState,
    room_id: &RoomId,
    user: &UserSession,
) -> Result<ScoreboardView, ServiceError> {
    let scoreboard = state
        .scoreboards()
        .get(room_id)
        .ok_or_else(|| scoreboard_not_open(room_id))?;
    let machine = state
        .confirmations()
        .get(room_id)
        .ok_or_else(|| scoreboard_not_open(room_id))?;
    Ok(ScoreboardView::new(
        room_id.clone(),
        &scoreboard,
        &machine,
        &user.user_id,
    ))
}

fn result_view(
    state: &SharedState,
    room_id: RoomId,
    user: &UserSession,
    result: Option<MatchResultDto>,
) -> Result<ResultView, ServiceError> {
    let machine = state
        .confirmations()
        .get(&room_id)
        .ok_or_else(|| ServiceError::NotFound(format!("no result is loaded for room {room_id}")))?;
    let confirmation = ConfirmationView::new(&machine, &user.user_id);
    drop(machine);
    Ok(ResultView {
        room_id,
        result,
        confirmation,
    })
}

fn scoreboard_not_open(room_id: &RoomId) -> ServiceError {
    ServiceError::NotFound(format!("no scoreboard is open for room {room_id}"))
}
