use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Last message a participant acknowledged in a conversation.
///
/// `last_acknowledged_message_id` is `None` until the first acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ReadMark {
    #[sqlx(rename = "chat_id")]
    pub conversation_id: i64,
    #[sqlx(rename = "user_id")]
    pub participant_id: i64,
    #[sqlx(rename = "last_read_message_id")]
    pub last_acknowledged_message_id: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReadMark {
    /// The mark of a pair that never acknowledged anything.
    pub fn never_read(conversation_id: i64, participant_id: i64) -> Self {
        Self {
            conversation_id,
            participant_id,
            last_acknowledged_message_id: None,
            updated_at: None,
        }
    }

    /// Whether acknowledging `message_id` would move this mark forward.
    pub fn would_advance(&self, message_id: i64) -> bool {
        self.last_acknowledged_message_id
            .map(|current| message_id > current)
            .unwrap_or(true)
    }
}

/// Outcome of a compare-and-set on a mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkUpdate {
    /// The mark after the operation
    pub mark: ReadMark,
    /// False when the stored value was already at or past the requested id
    pub advanced: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatReadRequest {
    #[validate(required(message = "userId is required"))]
    pub user_id: Option<i64>,
    #[validate(
        required(message = "lastReadMessageId is required"),
        range(min = 1, message = "lastReadMessageId must be positive")
    )]
    pub last_read_message_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReadResponse {
    pub chat_id: i64,
    pub user_id: i64,
    pub last_read_message_id: Option<i64>,
}

impl From<ReadMark> for ChatReadResponse {
    fn from(mark: ReadMark) -> Self {
        Self {
            chat_id: mark.conversation_id,
            user_id: mark.participant_id,
            last_read_message_id: mark.last_acknowledged_message_id,
        }
    }
}

/// Unread count of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadCount {
    pub conversation_id: i64,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub chat_id: i64,
    pub user_id: i64,
    pub unread_count: i64,
}

impl UnreadCountResponse {
    pub fn new(participant_id: i64, count: UnreadCount) -> Self {
        Self {
            chat_id: count.conversation_id,
            user_id: participant_id,
            unread_count: count.unread_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_read_advances_on_anything() {
        let mark = ReadMark::never_read(1, 2);
        assert!(mark.would_advance(1));
    }

    #[test]
    fn test_only_strictly_greater_advances() {
        let mark = ReadMark {
            last_acknowledged_message_id: Some(5),
            ..ReadMark::never_read(1, 2)
        };
        assert!(!mark.would_advance(4));
        assert!(!mark.would_advance(5));
        assert!(mark.would_advance(6));
    }
}
