//! Score entry for a best-of-three padel match with an optional super tie-break decider.

use thiserror::Error;

use crate::{
    api::models::{SetDto, SubmitResultRequest},
    state::teams::TeamSide,
};

/// Upper bound on recorded sets.
pub const MAX_SETS: usize = 3;
/// Set wins needed to take the match.
pub const SETS_TO_WIN: usize = 2;
/// Index of the only set that may be played as a super tie-break.
const DECIDER_INDEX: usize = 2;

/// A regular set is won 6–0..6–4, 7–5 or 7–6.
pub fn is_regular_set_valid(games_a: u16, games_b: u16) -> bool {
    let (max, min) = (games_a.max(games_b), games_a.min(games_b));
    (max == 6 && min <= 4) || (max == 7 && (min == 5 || min == 6))
}

/// A super tie-break is won with at least 10 points and a two-point lead. No cap.
pub fn is_super_tiebreak_valid(points_a: u16, points_b: u16) -> bool {
    let (max, min) = (points_a.max(points_b), points_a.min(points_b));
    max >= 10 && max - min >= 2
}

/// Rejected scoreboard operations. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// No set at this position.
    #[error("El set {} no existe", .0 + 1)]
    UnknownSet(usize),
    /// A fourth set was requested.
    #[error("Un partido tiene como máximo 3 sets")]
    TooManySets,
    /// Only a third set can be removed.
    #[error("No hay tercer set para quitar")]
    NoThirdSet,
    /// Neither side reached two set wins.
    #[error("Debe haber un ganador (2 sets)")]
    NoWinner,
}

/// Counts of one set. `winner` is recomputed on every change and is only present when the
/// counts satisfy the applicable win condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetScore {
    team_a: u16,
    team_b: u16,
    super_tiebreak: bool,
    winner: Option<TeamSide>,
}

impl SetScore {
    /// An empty set (0–0, not completed).
    pub fn new(super_tiebreak: bool) -> Self {
        Self {
            super_tiebreak,
            ..Self::default()
        }
    }

    /// A set with the given counts, evaluated immediately.
    pub fn with_counts(team_a: u16, team_b: u16, super_tiebreak: bool) -> Self {
        let mut set = Self::new(super_tiebreak);
        set.set_counts(team_a, team_b);
        set
    }

    /// Replace the counts and re-evaluate the set.
    pub fn set_counts(&mut self, team_a: u16, team_b: u16) {
        self.team_a = team_a;
        self.team_b = team_b;
        self.winner = self.evaluate();
    }

    fn evaluate(&self) -> Option<TeamSide> {
        let valid = if self.super_tiebreak {
            is_super_tiebreak_valid(self.team_a, self.team_b)
        } else {
            is_regular_set_valid(self.team_a, self.team_b)
        };

        match valid {
            false => None,
            true if self.team_a > self.team_b => Some(TeamSide::A),
            true => Some(TeamSide::B),
        }
    }

    pub fn team_a(&self) -> u16 {
        self.team_a
    }

    pub fn team_b(&self) -> u16 {
        self.team_b
    }

    pub fn is_super_tiebreak(&self) -> bool {
        self.super_tiebreak
    }

    /// True iff the counts form a finished set.
    pub fn is_completed(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<TeamSide> {
        self.winner
    }
}

impl From<&SetScore> for SetDto {
    fn from(set: &SetScore) -> Self {
        Self {
            team_a: set.team_a,
            team_b: set.team_b,
            super_tiebreak: set.super_tiebreak,
        }
    }
}

/// Local, unsubmitted score entry for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    sets: Vec<SetScore>,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            sets: vec![SetScore::new(false), SetScore::new(false)],
        }
    }
}

impl Scoreboard {
    /// Empty scoreboard with the two mandatory sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scoreboard pre-filled from a previously submitted result.
    pub fn from_sets(sets: &[SetDto]) -> Self {
        let mut board = Self::new();
        for (index, set) in sets.iter().take(MAX_SETS).enumerate() {
            let super_tiebreak = index == DECIDER_INDEX && set.super_tiebreak;
            let score = SetScore::with_counts(set.team_a, set.team_b, super_tiebreak);
            match board.sets.get_mut(index) {
                Some(slot) => *slot = score,
                None => board.sets.push(score),
            }
        }
        board
    }

    pub fn sets(&self) -> &[SetScore] {
        &self.sets
    }

    /// Update the counts of the set at `index`.
    pub fn update_set(
        &mut self,
        index: usize,
        team_a: u16,
        team_b: u16,
    ) -> Result<SetScore, ScoreError> {
        let set = self
            .sets
            .get_mut(index)
            .ok_or(ScoreError::UnknownSet(index))?;
        set.set_counts(team_a, team_b);
        Ok(*set)
    }

    /// Append the third set. Allowed even when the first two already decide the match; such a
    /// set is ignored when the result is submitted.
    pub fn add_third_set(&mut self, super_tiebreak: bool) -> Result<(), ScoreError> {
        if self.sets.len() >= MAX_SETS {
            return Err(ScoreError::TooManySets);
        }
        self.sets.push(SetScore::new(super_tiebreak));
        Ok(())
    }

    /// Drop the third set.
    pub fn remove_third_set(&mut self) -> Result<(), ScoreError> {
        if self.sets.len() <= DECIDER_INDEX {
            return Err(ScoreError::NoThirdSet);
        }
        self.sets.truncate(DECIDER_INDEX);
        Ok(())
    }

    /// Walk completed sets in order and return the position of the set where a side reached
    /// two wins, along with that side.
    fn decision(&self) -> Option<(usize, TeamSide)> {
        let (mut wins_a, mut wins_b) = (0, 0);
        for (index, set) in self.sets.iter().enumerate() {
            match set.winner() {
                Some(TeamSide::A) => wins_a += 1,
                Some(TeamSide::B) => wins_b += 1,
                None => continue,
            }
            if wins_a == SETS_TO_WIN {
                return Some((index, TeamSide::A));
            }
            if wins_b == SETS_TO_WIN {
                return Some((index, TeamSide::B));
            }
        }
        None
    }

    /// Set wins per side, counted up to the deciding set.
    pub fn set_wins(&self) -> (usize, usize) {
        let last = self
            .decision()
            .map(|(index, _)| index)
            .unwrap_or(self.sets.len().saturating_sub(1));
        self.sets
            .iter()
            .take(last + 1)
            .fold((0, 0), |(a, b), set| match set.winner() {
                Some(TeamSide::A) => (a + 1, b),
                Some(TeamSide::B) => (a, b + 1),
                None => (a, b),
            })
    }

    /// Match winner, once a side has two set wins.
    pub fn winner(&self) -> Option<TeamSide> {
        self.decision().map(|(_, side)| side)
    }

    /// Payload for the backend: completed sets up to the deciding one plus the winner.
    pub fn submission(&self) -> Result<SubmitResultRequest, ScoreError> {
        let (decided_at, winner) = self.decision().ok_or(ScoreError::NoWinner)?;

        let sets = self.sets[..=decided_at]
            .iter()
            .filter(|set| set.is_completed())
            .map(SetDto::from)
            .collect();

        Ok(SubmitResultRequest {
            sets,
            winner: winner.number(),
        })
    }
}
