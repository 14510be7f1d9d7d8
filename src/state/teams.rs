//! Team assignment panel: splits a four-entrant roster into two pairs.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::api::models::{AssignTeamsRequest, EntrantDto, EntrantId};

/// Rating assumed for entrants the backend sends without one.
pub const DEFAULT_RATING: f64 = 1500.0;
/// Players per team.
pub const TEAM_SIZE: usize = 2;
/// Entrants needed for a match.
pub const ROSTER_SIZE: usize = 4;

/// Read-only view of a roster entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    pub rating: f64,
}

impl From<EntrantDto> for Entrant {
    fn from(value: EntrantDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
            rating: value.rating.unwrap_or(DEFAULT_RATING),
        }
    }
}

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    /// Team 1 on the wire.
    A,
    /// Team 2 on the wire.
    B,
}

impl TeamSide {
    /// Team number used by the backend.
    pub fn number(self) -> u8 {
        match self {
            TeamSide::A => 1,
            TeamSide::B => 2,
        }
    }

    /// Parse a backend team number.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(TeamSide::A),
            2 => Some(TeamSide::B),
            _ => None,
        }
    }

    /// The opposing side.
    pub fn other(self) -> Self {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }
}

/// Rejected panel operations. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    /// The target team already holds two entrants.
    #[error("El equipo ya tiene 2 jugadores")]
    TeamFull(TeamSide),
    /// The entrant is not part of this room's roster.
    #[error("El jugador {0} no pertenece a la sala")]
    UnknownEntrant(EntrantId),
    /// Automatic assignment needs exactly four entrants.
    #[error("Se necesitan exactamente 4 jugadores (hay {0})")]
    RosterSize(usize),
    /// Submission needs both teams complete.
    #[error("Ambos equipos deben tener 2 jugadores")]
    Incomplete,
}

/// Local state of the team assignment panel for one room.
#[derive(Debug, Clone, Default)]
pub struct TeamAssignment {
    roster: IndexMap<EntrantId, Entrant>,
    team_a: Vec<EntrantId>,
    team_b: Vec<EntrantId>,
}

impl TeamAssignment {
    /// Open a panel over `entrants`, keeping roster order. Every entrant starts unassigned.
    pub fn new(entrants: impl IntoIterator<Item = Entrant>) -> Self {
        Self {
            roster: entrants
                .into_iter()
                .map(|entrant| (entrant.id.clone(), entrant))
                .collect(),
            team_a: Vec::with_capacity(TEAM_SIZE),
            team_b: Vec::with_capacity(TEAM_SIZE),
        }
    }

    /// Open a panel from the backend roster, pre-filling teams the backend already knows.
    pub fn from_roster(entrants: Vec<EntrantDto>) -> Self {
        let existing: Vec<(EntrantId, TeamSide)> = entrants
            .iter()
            .filter_map(|entrant| {
                let side = entrant.team.and_then(TeamSide::from_number)?;
                Some((entrant.id.clone(), side))
            })
            .collect();

        let mut panel = Self::new(entrants.into_iter().map(Entrant::from));
        for (id, side) in existing {
            if let Err(err) = panel.move_to(&id, side) {
                debug!(entrant = %id, error = %err, "ignoring stored team assignment");
            }
        }
        panel
    }

    /// Entrants in roster order.
    pub fn roster(&self) -> impl Iterator<Item = &Entrant> {
        self.roster.values()
    }

    /// Members of `side`, in the order they were placed.
    pub fn team(&self, side: TeamSide) -> Vec<&Entrant> {
        self.members(side)
            .iter()
            .filter_map(|id| self.roster.get(id))
            .collect()
    }

    /// Entrants not yet placed in a team, in roster order.
    pub fn unassigned(&self) -> Vec<&Entrant> {
        self.roster
            .values()
            .filter(|entrant| self.side_of(&entrant.id).is_none())
            .collect()
    }

    /// Team currently holding `id`, if any.
    pub fn side_of(&self, id: &EntrantId) -> Option<TeamSide> {
        if self.team_a.contains(id) {
            Some(TeamSide::A)
        } else if self.team_b.contains(id) {
            Some(TeamSide::B)
        } else {
            None
        }
    }

    /// True when both teams hold exactly two entrants.
    pub fn is_complete(&self) -> bool {
        self.team_a.len() == TEAM_SIZE && self.team_b.len() == TEAM_SIZE
    }

    /// Place an entrant in `side`, taking it out of the other team if needed.
    pub fn move_to(&mut self, id: &EntrantId, side: TeamSide) -> Result<(), TeamError> {
        if !self.roster.contains_key(id) {
            return Err(TeamError::UnknownEntrant(id.clone()));
        }
        if self.side_of(id) == Some(side) {
            return Ok(());
        }
        if self.members(side).len() >= TEAM_SIZE {
            return Err(TeamError::TeamFull(side));
        }

        self.members_mut(side.other()).retain(|member| member != id);
        self.members_mut(side).push(id.clone());
        Ok(())
    }

    /// Return an entrant to the unassigned pool.
    pub fn remove(&mut self, id: &EntrantId) -> Result<(), TeamError> {
        if !self.roster.contains_key(id) {
            return Err(TeamError::UnknownEntrant(id.clone()));
        }
        self.team_a.retain(|member| member != id);
        self.team_b.retain(|member| member != id);
        Ok(())
    }

    /// Snake seeding over the ratings: after a stable descending sort, ranks 1 and 4 form
    /// team A and ranks 2 and 3 form team B.
    pub fn auto_assign(&mut self) -> Result<(), TeamError> {
        if self.roster.len() != ROSTER_SIZE {
            return Err(TeamError::RosterSize(self.roster.len()));
        }

        let mut ranked: Vec<&Entrant> = self.roster.values().collect();
        ranked.sort_by(|left, right| right.rating.total_cmp(&left.rating));

        self.team_a = vec![ranked[0].id.clone(), ranked[3].id.clone()];
        self.team_b = vec![ranked[1].id.clone(), ranked[2].id.clone()];
        Ok(())
    }

    /// Build the payload for the backend, or reject when a team is incomplete.
    pub fn submission(&self) -> Result<AssignTeamsRequest, TeamError> {
        if !self.is_complete() {
            return Err(TeamError::Incomplete);
        }

        let assignments: BTreeMap<EntrantId, u8> = [TeamSide::A, TeamSide::B]
            .into_iter()
            .flat_map(|side| {
                self.members(side)
                    .iter()
                    .map(move |id| (id.clone(), side.number()))
            })
            .collect();

        Ok(AssignTeamsRequest { assignments })
    }

    /// Replace the roster with a freshly fetched one. Entrants who left are dropped from their
    /// team; newcomers start unassigned. Returns whether anything changed.
    pub fn sync_roster(&mut self, entrants: impl IntoIterator<Item = Entrant>) -> bool {
        let roster: IndexMap<EntrantId, Entrant> = entrants
            .into_iter()
            .map(|entrant| (entrant.id.clone(), entrant))
            .collect();
        if roster == self.roster {
            return false;
        }

        self.team_a.retain(|id| roster.contains_key(id));
        self.team_b.retain(|id| roster.contains_key(id));
        self.roster = roster;
        true
    }

    fn members(&self, side: TeamSide) -> &Vec<EntrantId> {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    fn members_mut(&mut self, side: TeamSide) -> &mut Vec<EntrantId> {
        match side {
            TeamSide::A => &mut self.team_a,
            TeamSide::B => &mut self.team_b,
        }
    }
}
