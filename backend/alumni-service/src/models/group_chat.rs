use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Owner,
    Member,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Owner => "OWNER",
            ParticipantRole::Member => "MEMBER",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupChat {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(skip_serializing)]
    pub group_id: i64,
    pub user_id: i64,
    pub username: String,
    pub role: ParticipantRole,
}

/// A group with its participants loaded.
#[derive(Debug, Clone)]
pub struct GroupChatDetails {
    pub group: GroupChat,
    pub participants: Vec<Participant>,
}

impl GroupChatDetails {
    pub fn participant(&self, user_id: i64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewGroupChat {
    pub name: String,
    pub owner_id: i64,
    pub participants: Vec<NewParticipant>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub user_id: i64,
    pub username: String,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRequest {
    pub user_id: i64,
    #[validate(custom(function = "validate_not_blank", message = "username is required"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(
        length(max = 100, message = "name must be at most 100 characters"),
        custom(function = "validate_not_blank", message = "name is required")
    )]
    pub name: String,
    #[validate(
        length(min = 2, message = "a group needs at least 2 participants"),
        nested
    )]
    pub participants: Vec<ParticipantRequest>,
    #[validate(required(message = "ownerId is required"))]
    pub owner_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChatResponse {
    pub group_id: i64,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
}

impl From<GroupChatDetails> for GroupChatResponse {
    fn from(details: GroupChatDetails) -> Self {
        Self {
            group_id: details.group.id,
            name: details.group.name,
            owner_id: details.group.owner_id,
            created_at: details.group.created_at,
            participants: details.participants,
        }
    }
}
