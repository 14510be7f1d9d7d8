use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{EntrantId, RoomId},
    state::teams::{Entrant, TeamAssignment, TeamSide},
};

/// Target team for a manual move.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveEntrantRequest {
    pub side: TeamSide,
}

/// Roster entry shown in the panel.
#[derive(Debug, Serialize, ToSchema)]
pub struct EntrantView {
    pub id: EntrantId,
    pub name: String,
    /// Rating used for seeding; 1500 when the backend had none.
    pub rating: f64,
}

impl From<&Entrant> for EntrantView {
    fn from(value: &Entrant) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            rating: value.rating,
        }
    }
}

/// Current state of a room's team assignment panel.
#[derive(Debug, Serialize, ToSchema)]
pub struct PanelView {
    pub room_id: RoomId,
    pub team_a: Vec<EntrantView>,
    pub team_b: Vec<EntrantView>,
    pub unassigned: Vec<EntrantView>,
    /// True when both teams hold two entrants and the panel can be submitted.
    pub complete: bool,
}

impl PanelView {
    pub fn new(room_id: RoomId, panel: &TeamAssignment) -> Self {
        Self {
            room_id,
            team_a: views(panel.team(TeamSide::A)),
            team_b: views(panel.team(TeamSide::B)),
            unassigned: views(panel.unassigned()),
            complete: panel.is_complete(),
        }
    }
}

fn views(entrants: Vec<&Entrant>) -> Vec<EntrantView> {
    entrants.into_iter().map(EntrantView::from).collect()
}
