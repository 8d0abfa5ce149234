use error_types::error_codes;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::group_chats::GroupChatService;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{
    GroupMessage, GroupMessagesQuery, NewGroupMessage, Page, PageRequest, SendGroupMessageRequest,
    DEFAULT_GROUP_MESSAGE_PAGE_SIZE,
};
use crate::repository::GroupMessageRepository;
use crate::websocket::{publish, ConnectionRegistry, Topic, WsEvent};

pub struct GroupMessageService {
    messages: Arc<dyn GroupMessageRepository>,
    groups: Arc<GroupChatService>,
    registry: ConnectionRegistry,
}

impl GroupMessageService {
    pub fn new(
        messages: Arc<dyn GroupMessageRepository>,
        groups: Arc<GroupChatService>,
        registry: ConnectionRegistry,
    ) -> Self {
        Self {
            messages,
            groups,
            registry,
        }
    }

    /// Persist a message from a member and push it to the group's subscribers.
    pub async fn send(&self, group_id: i64, req: SendGroupMessageRequest) -> AppResult<GroupMessage> {
        req.validate()?;
        let user_id = req
            .user_id
            .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;
        let sender = self.groups.require_member(group_id, user_id).await?;

        let message = self
            .messages
            .create(NewGroupMessage {
                group_id,
                sender_id: user_id,
                sender_username: sender.username,
                content: req.content.trim().to_string(),
            })
            .await?;

        metrics::record_message_sent("group");
        info!(group_id, message_id = message.id, sender_id = user_id, "group message sent");

        publish(
            &self.registry,
            Topic::Group(group_id),
            &WsEvent::GroupMessage {
                message: message.clone(),
            },
        )
        .await;
        Ok(message)
    }

    pub async fn list(&self, group_id: i64, query: GroupMessagesQuery) -> AppResult<Page<GroupMessage>> {
        self.groups.require_member(group_id, query.user_id).await?;

        let page = PageRequest::normalize(query.page, query.size, DEFAULT_GROUP_MESSAGE_PAGE_SIZE);
        let (content, total) = self.messages.list_page(group_id, page).await?;
        Ok(Page::new(content, page, total))
    }

    /// Only the sender may delete a message.
    pub async fn delete(&self, group_id: i64, message_id: i64, user_id: i64) -> AppResult<()> {
        self.groups.require_member(group_id, user_id).await?;

        let message = self
            .messages
            .find(group_id, message_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    error_codes::MESSAGE_NOT_FOUND,
                    format!("Message not found with id: {}", message_id),
                )
            })?;
        if message.sender_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own messages".to_string(),
            ));
        }

        self.messages.delete(message_id).await?;
        info!(group_id, message_id, "group message deleted");

        publish(
            &self.registry,
            Topic::Group(group_id),
            &WsEvent::GroupMessageDeleted {
                group_id,
                message_id,
            },
        )
        .await;
        Ok(())
    }
}
