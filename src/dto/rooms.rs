use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    api::models::{CategoryId, CreateRoomRequest, EntrantId, JoinRoomRequest, RoomDto},
    dto::{
        format_system_time,
        validation::{normalize_invitation_code, validate_invitation_code},
    },
    state::RoomSnapshot,
};

/// Payload used to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomBody {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// RFC 3339 date-time the match is planned for.
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub category_id: Option<CategoryId>,
}

impl From<CreateRoomBody> for CreateRoomRequest {
    fn from(value: CreateRoomBody) -> Self {
        Self {
            name: value.name.trim().to_string(),
            scheduled_at: value.scheduled_at,
            category_id: value.category_id,
        }
    }
}

/// Payload used to join a room with its invitation code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomBody {
    #[validate(custom(function = "validate_invitation_code"))]
    pub code: String,
}

impl From<JoinRoomBody> for JoinRoomRequest {
    fn from(value: JoinRoomBody) -> Self {
        Self {
            code: normalize_invitation_code(&value.code),
        }
    }
}

/// Room as returned to the local surface, annotated for the signed-in user.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: RoomDto,
    /// True when the signed-in user created the room.
    pub is_creator: bool,
    /// True when the signed-in user is on the roster.
    pub is_participant: bool,
}

impl RoomView {
    pub fn for_user(room: RoomDto, user: &EntrantId) -> Self {
        let is_creator = room.creator_id == *user;
        let is_participant = is_creator || room.entrants.iter().any(|entrant| entrant.id == *user);
        Self {
            room,
            is_creator,
            is_participant,
        }
    }
}

/// Latest room state published by a watcher.
#[derive(Debug, Serialize, ToSchema)]
pub struct WatchView {
    pub watching: bool,
    /// Absent until the first poll succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
    pub generation: u64,
}

impl WatchView {
    pub fn stopped() -> Self {
        Self {
            watching: false,
            room: None,
            fetched_at: None,
            generation: 0,
        }
    }

    pub fn from_snapshot(snapshot: Option<RoomSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) => Self {
                watching: true,
                fetched_at: Some(format_system_time(snapshot.fetched_at)),
                generation: snapshot.generation,
                room: Some(snapshot.room),
            },
            None => Self {
                watching: true,
                ..Self::stopped()
            },
        }
    }
}
