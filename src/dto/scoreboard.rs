use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    api::models::{EntrantId, MatchResultDto, RoomId},
    state::{
        confirmation::{ConfirmationMachine, ConfirmationState},
        scoreboard::{Scoreboard, SetScore},
        teams::TeamSide,
    },
};

/// New counts for one set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSetRequest {
    pub team_a: u16,
    pub team_b: u16,
}

/// Third set to add.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AddSetRequest {
    /// Play the decider as a super tie-break.
    #[serde(default)]
    pub super_tiebreak: bool,
}

/// Justification of a dispute.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DisputeBody {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Confirmation state exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleConfirmationState {
    /// Nothing submitted yet.
    NoResult,
    /// Waiting for the opposing side.
    PendingConfirmation,
    /// Accepted; ratings applied by the backend.
    Confirmed,
    /// Rejected by the opposing side.
    Disputed,
}

impl From<ConfirmationState> for VisibleConfirmationState {
    fn from(value: ConfirmationState) -> Self {
        match value {
            ConfirmationState::NoResult => VisibleConfirmationState::NoResult,
            ConfirmationState::PendingConfirmation => {
                VisibleConfirmationState::PendingConfirmation
            }
            ConfirmationState::Confirmed => VisibleConfirmationState::Confirmed,
            ConfirmationState::Disputed => VisibleConfirmationState::Disputed,
        }
    }
}

/// Where the result stands and what the signed-in user may do about it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmationView {
    pub state: VisibleConfirmationState,
    pub version: usize,
    /// The user may edit and submit the score.
    pub can_submit: bool,
    /// The user may confirm or dispute the submitted score.
    pub can_respond: bool,
}

impl ConfirmationView {
    pub fn new(machine: &ConfirmationMachine, user: &EntrantId) -> Self {
        let snapshot = machine.snapshot();
        Self {
            state: snapshot.state.into(),
            version: snapshot.version,
            can_submit: machine.ensure_can_edit(user).is_ok(),
            can_respond: machine.ensure_can_respond(user).is_ok(),
        }
    }
}

/// One set as entered locally.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetView {
    /// 1-based set number.
    pub number: usize,
    pub team_a: u16,
    pub team_b: u16,
    pub super_tiebreak: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<TeamSide>,
}

impl SetView {
    fn new(index: usize, set: &SetScore) -> Self {
        Self {
            number: index + 1,
            team_a: set.team_a(),
            team_b: set.team_b(),
            super_tiebreak: set.is_super_tiebreak(),
            completed: set.is_completed(),
            winner: set.winner(),
        }
    }
}

/// Local score entry of a room together with its confirmation state.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreboardView {
    pub room_id: RoomId,
    pub sets: Vec<SetView>,
    /// Completed sets won by team A up to the deciding set.
    pub sets_won_a: usize,
    /// Completed sets won by team B up to the deciding set.
    pub sets_won_b: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<TeamSide>,
    pub confirmation: ConfirmationView,
}

impl ScoreboardView {
    pub fn new(
        room_id: RoomId,
        scoreboard: &Scoreboard,
        machine: &ConfirmationMachine,
        user: &EntrantId,
    ) -> Self {
        let (sets_won_a, sets_won_b) = scoreboard.set_wins();
        Self {
            room_id,
            sets: scoreboard
                .sets()
                .iter()
                .enumerate()
                .map(|(index, set)| SetView::new(index, set))
                .collect(),
            sets_won_a,
            sets_won_b,
            winner: scoreboard.winner(),
            confirmation: ConfirmationView::new(machine, user),
        }
    }
}

/// Result stored on the backend plus the local confirmation view.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultView {
    pub room_id: RoomId,
    /// Absent while nothing was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResultDto>,
    pub confirmation: ConfirmationView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::confirmation::ConfirmationEvent;

    #[test]
    fn confirmation_view_reflects_roles() {
        let creator = EntrantId::new("creator");
        let rival = EntrantId::new("rival");
        let outsider = EntrantId::new("outsider");
        let mut machine =
            ConfirmationMachine::new(creator.clone(), [creator.clone(), rival.clone()]);

        let view = ConfirmationView::new(&machine, &creator);
        assert!(view.can_submit);
        assert!(!view.can_respond);

        let plan = machine
            .plan(ConfirmationEvent::Submit {
                by: creator.clone(),
            })
            .unwrap();
        machine.apply(plan.id).unwrap();

        let view = ConfirmationView::new(&machine, &rival);
        assert_eq!(view.state, VisibleConfirmationState::PendingConfirmation);
        assert!(!view.can_submit);
        assert!(view.can_respond);

        let view = ConfirmationView::new(&machine, &outsider);
        assert!(!view.can_submit);
        assert!(!view.can_respond);
    }
}
