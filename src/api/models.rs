//! Wire representations of the REST backend payloads.
//!
//! The backend is loosely typed: identifiers come back as numbers or strings, ratings may be
//! missing, null or stringified, and enum-like fields grow new values over time. Everything is
//! normalised here so the rest of the crate only deals with explicit types.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdInner {
    Number(serde_json::Number),
    String(String),
}

impl From<IdInner> for String {
    fn from(inner: IdInner) -> Self {
        match inner {
            IdInner::Number(n) => n.to_string(),
            IdInner::String(s) => s,
        }
    }
}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, ToSchema,
        )]
        #[serde(from = "IdInner", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<IdInner> for $name {
            fn from(inner: IdInner) -> Self {
                Self(inner.into())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

wire_id!(
    /// Identifier of a room (match session).
    RoomId
);
wire_id!(
    /// Identifier of a user taking part in rooms.
    EntrantId
);
wire_id!(
    /// Identifier of a ranking category.
    CategoryId
);

/// Lifecycle of a room as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Waiting for entrants to join.
    #[default]
    Waiting,
    /// Match in play.
    #[serde(alias = "in_play", alias = "playing")]
    Active,
    /// Match over.
    Finished,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Roster entry of a room.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct EntrantDto {
    pub id: EntrantId,
    #[serde(default, alias = "username")]
    pub name: String,
    /// Missing, null and stringified ratings are accepted; anything unparseable reads as
    /// missing.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<f64>,
    /// Team number (1 or 2) once teams have been assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<u8>,
}

/// Room (scheduled match session) with up to four entrants.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct RoomDto {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    /// Six-character invitation code.
    #[serde(default, alias = "invitation_code")]
    pub code: Option<String>,
    pub creator_id: EntrantId,
    #[serde(default)]
    pub status: RoomStatus,
    #[serde(default, alias = "players")]
    pub entrants: Vec<EntrantDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
}

impl RoomDto {
    /// Ids of everyone on the roster, in roster order.
    pub fn entrant_ids(&self) -> impl Iterator<Item = EntrantId> + '_ {
        self.entrants.iter().map(|entrant| entrant.id.clone())
    }
}

/// Body of `POST /rooms`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

/// Body of `POST /rooms/join`.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRoomRequest {
    pub code: String,
}

/// Body of `PUT /rooms/{id}/teams`: entrant identifier to team number (1 or 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignTeamsRequest {
    pub assignments: BTreeMap<EntrantId, u8>,
}

/// Game (or point) counts of one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct SetDto {
    pub team_a: u16,
    pub team_b: u16,
    #[serde(default)]
    pub super_tiebreak: bool,
}

/// Body of `POST /rooms/{id}/result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubmitResultRequest {
    pub sets: Vec<SetDto>,
    /// Declared winner team number (1 or 2).
    pub winner: u8,
}

/// Body of `POST /rooms/{id}/result/report`.
#[derive(Debug, Clone, Serialize)]
pub struct DisputeRequest {
    pub reason: String,
}

/// Confirmation status of a submitted result as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemoteResultStatus {
    /// Waiting for the opposing side.
    #[default]
    #[serde(alias = "pending")]
    PendingConfirmation,
    /// Accepted by the opposing side; ratings applied.
    Confirmed,
    /// Rejected by the opposing side.
    #[serde(alias = "reported")]
    Disputed,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Result stored for a room.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct MatchResultDto {
    #[serde(default)]
    pub sets: Vec<SetDto>,
    #[serde(default)]
    pub winner: Option<u8>,
    #[serde(default)]
    pub status: RemoteResultStatus,
    #[serde(default)]
    pub submitted_by: Option<EntrantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispute_reason: Option<String>,
}

/// One row of a ranking table.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct RankingEntryDto {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(alias = "id", alias = "user_id")]
    pub entrant_id: EntrantId,
    #[serde(default, alias = "username")]
    pub name: String,
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub matches_played: Option<u32>,
}

/// Rating band used to group players.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct CategoryDto {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    /// Inclusive lower bound, open when absent.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<f64>)]
    pub min_rating: Option<f64>,
    /// Exclusive upper bound, open when absent.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<f64>)]
    pub max_rating: Option<f64>,
}

impl CategoryDto {
    /// Whether a rating falls inside this category's band.
    pub fn contains(&self, rating: f64) -> bool {
        self.min_rating.is_none_or(|min| rating >= min)
            && self.max_rating.is_none_or(|max| rating < max)
    }
}

/// Aggregate counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct AdminStatsDto {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_rooms: u64,
    #[serde(default)]
    pub total_matches: u64,
    #[serde(default)]
    pub pending_confirmations: u64,
    #[serde(default)]
    pub open_disputes: u64,
}

/// Backend log line exposed to administrators.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct LogEntryDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub context: Option<serde_json::Value>,
}

fn default_log_level() -> String {
    "info".into()
}

/// Error payload returned by the backend on non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

impl BackendErrorBody {
    /// Most specific human-readable message the backend provided.
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.detail)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn room_payload_accepts_loose_types() {
        let room: RoomDto = serde_json::from_value(json!({
            "id": 42,
            "name": "Domingo",
            "invitation_code": "AB12CD",
            "creator_id": "7",
            "status": "in_play",
            "players": [
                { "id": 7, "name": "Ana", "rating": 1650 },
                { "id": "8", "name": "Luis", "rating": "1420.5" },
                { "id": 9, "name": "Marta", "rating": null },
                { "id": 10, "name": "Pablo" },
                { "id": 11, "name": "Rosa", "rating": "n/a" },
                { "id": 12, "name": "Sergio", "rating": "" },
                { "id": 13, "name": "Tere", "rating": { "elo": 1500 } }
            ]
        }))
        .unwrap();

        assert_eq!(room.id, RoomId::new("42"));
        assert_eq!(room.code.as_deref(), Some("AB12CD"));
        assert_eq!(room.creator_id, EntrantId::new("7"));
        assert_eq!(room.status, RoomStatus::Active);
        let ratings: Vec<_> = room.entrants.iter().map(|e| e.rating).collect();
        assert_eq!(
            ratings,
            vec![Some(1650.0), Some(1420.5), None, None, None, None, None]
        );
    }

    #[test]
    fn unknown_statuses_do_not_fail_decoding() {
        let room: RoomDto = serde_json::from_value(json!({
            "id": "r1",
            "creator_id": 1,
            "status": "archived"
        }))
        .unwrap();
        assert_eq!(room.status, RoomStatus::Unknown);
        assert!(room.entrants.is_empty());

        let result: MatchResultDto = serde_json::from_value(json!({
            "sets": [{ "team_a": 6, "team_b": 2 }],
            "status": "reported"
        }))
        .unwrap();
        assert_eq!(result.status, RemoteResultStatus::Disputed);
        assert!(!result.sets[0].super_tiebreak);
    }

    #[test]
    fn team_assignments_serialize_as_string_keyed_map() {
        let mut assignments = BTreeMap::new();
        assignments.insert(EntrantId::new("7"), 1);
        assignments.insert(EntrantId::new("8"), 2);

        let body = serde_json::to_value(AssignTeamsRequest { assignments }).unwrap();
        assert_eq!(body, json!({ "assignments": { "7": 1, "8": 2 } }));
    }

    #[test]
    fn category_bounds_are_half_open() {
        let category = CategoryDto {
            id: CategoryId::new("3"),
            name: "Tercera".into(),
            min_rating: Some(1500.0),
            max_rating: Some(1700.0),
        };
        assert!(category.contains(1500.0));
        assert!(category.contains(1699.9));
        assert!(!category.contains(1700.0));
        assert!(!category.contains(1499.0));
    }

    #[test]
    fn error_body_prefers_message_over_error() {
        let body: BackendErrorBody = serde_json::from_value(json!({
            "error": "Bad Request",
            "message": "La sala está llena",
            "error_type": "business"
        }))
        .unwrap();
        assert_eq!(body.error_type.as_deref(), Some("business"));
        assert_eq!(body.into_message().as_deref(), Some("La sala está llena"));
    }
}
