use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_not_blank;

pub const DEFAULT_GROUP_MESSAGE_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroupMessage {
    pub group_id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessageRequest {
    #[validate(required(message = "userId is required"))]
    pub user_id: Option<i64>,
    #[validate(
        length(min = 1, max = 1000, message = "content must be 1-1000 characters"),
        custom(function = "validate_not_blank", message = "content must not be blank")
    )]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessagesQuery {
    pub user_id: i64,
    pub page: Option<i64>,
    pub size: Option<i64>,
}
