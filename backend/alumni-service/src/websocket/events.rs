use serde::{Deserialize, Serialize};

use super::{ConnectionRegistry, Topic};
use crate::models::{ChatMessage, GroupMessage};

/// Server to client events, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    GroupMessage {
        message: GroupMessage,
    },
    GroupMessageDeleted {
        #[serde(rename = "groupId")]
        group_id: i64,
        #[serde(rename = "messageId")]
        message_id: i64,
    },
    ChatMessage {
        message: ChatMessage,
    },
    ReadReceipt {
        #[serde(rename = "chatId")]
        chat_id: i64,
        #[serde(rename = "userId")]
        user_id: i64,
        #[serde(rename = "lastReadMessageId")]
        last_read_message_id: Option<i64>,
    },
    Pong,
    Error {
        message: String,
    },
}

impl WsEvent {
    pub fn error(message: impl Into<String>) -> Self {
        WsEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serialising these variants cannot fail: every field is a plain value.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}

/// Client to server events
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsInboundEvent {
    Ping,
    Read {
        #[serde(rename = "messageId")]
        message_id: i64,
    },
}

/// Serialise `event` and broadcast it on `topic`.
pub async fn publish(registry: &ConnectionRegistry, topic: Topic, event: &WsEvent) {
    tracing::debug!(topic = %topic, "publishing websocket event");
    registry.broadcast(topic, event.to_json()).await;
}
