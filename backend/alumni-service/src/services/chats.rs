use error_types::error_codes;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{
    Chat, ChatMessage, ChatMessagesQuery, SendChatMessageRequest, DEFAULT_CHAT_MESSAGE_LIMIT,
    MAX_PAGE_SIZE,
};
use crate::repository::{ChatRepository, UserRepository};
use crate::websocket::{publish, ConnectionRegistry, Topic, WsEvent};

pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    users: Arc<dyn UserRepository>,
    registry: ConnectionRegistry,
}

impl ChatService {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        users: Arc<dyn UserRepository>,
        registry: ConnectionRegistry,
    ) -> Self {
        Self {
            chats,
            users,
            registry,
        }
    }

    /// Existing chat for the pair, or a new one.
    pub async fn open_chat(&self, user_a: i64, user_b: i64) -> AppResult<Chat> {
        if user_a == user_b {
            return Err(AppError::BadRequest(
                "A chat needs two different users".to_string(),
            ));
        }
        for user_id in [user_a, user_b] {
            if !self.users.exists(user_id).await? {
                return Err(AppError::user_not_found(user_id));
            }
        }
        self.chats.find_or_create(user_a, user_b).await
    }

    pub async fn chats_for_user(&self, user_id: i64) -> AppResult<Vec<Chat>> {
        self.chats.list_for_user(user_id).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        req: SendChatMessageRequest,
    ) -> AppResult<ChatMessage> {
        req.validate()?;
        self.require_participant(chat_id, req.sender_id).await?;

        let message = self
            .chats
            .create_message(chat_id, req.sender_id, req.content.trim())
            .await?;

        metrics::record_message_sent("direct");
        info!(chat_id, message_id = message.id, sender_id = req.sender_id, "chat message sent");

        publish(
            &self.registry,
            Topic::Chat(chat_id),
            &WsEvent::ChatMessage {
                message: message.clone(),
            },
        )
        .await;
        Ok(message)
    }

    /// Newest first. Pass the smallest id seen as `before` to get the next page.
    pub async fn messages(&self, chat_id: i64, query: ChatMessagesQuery) -> AppResult<Vec<ChatMessage>> {
        self.require_participant(chat_id, query.user_id).await?;
        let limit = query
            .limit
            .unwrap_or(DEFAULT_CHAT_MESSAGE_LIMIT)
            .clamp(1, MAX_PAGE_SIZE);
        self.chats.list_messages(chat_id, query.before, limit).await
    }

    pub async fn require_participant(&self, chat_id: i64, user_id: i64) -> AppResult<Chat> {
        let chat = self.chats.find_by_id(chat_id).await?.ok_or_else(|| {
            AppError::not_found(
                error_codes::CHAT_NOT_FOUND,
                format!("Chat not found with id: {}", chat_id),
            )
        })?;
        if !chat.has_participant(user_id) {
            return Err(AppError::not_a_member());
        }
        Ok(chat)
    }
}
