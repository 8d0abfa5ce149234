use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{ordered_pair, Chat, ChatMessage};
use crate::repository::{ChatRepository, ConversationDirectory, MessageStore};

/// Direct chats and their messages. Also serves as the message store and
/// conversation directory behind read receipts.
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn find_or_create(&self, user_a: i64, user_b: i64) -> AppResult<Chat> {
        let (user1_id, user2_id) = ordered_pair(user_a, user_b);
        // The no-op update makes RETURNING yield the existing row on conflict.
        let chat = sqlx::query_as::<_, Chat>(
            r#"
            INSERT INTO chats (user1_id, user2_id)
            VALUES ($1, $2)
            ON CONFLICT (user1_id, user2_id) DO UPDATE SET user1_id = EXCLUDED.user1_id
            RETURNING id, user1_id, user2_id, created_at
            "#,
        )
        .bind(user1_id)
        .bind(user2_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(chat)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(
            "SELECT id, user1_id, user2_id, created_at FROM chats WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chat)
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Chat>> {
        let chats = sqlx::query_as::<_, Chat>(
            r#"
            SELECT id, user1_id, user2_id, created_at
            FROM chats
            WHERE user1_id = $1 OR user2_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chats)
    }

    async fn create_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        content: &str,
    ) -> AppResult<ChatMessage> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (chat_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, chat_id, sender_id, content, created_at
            "#,
        )
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list_messages(
        &self,
        chat_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, chat_id, sender_id, content, created_at
            FROM chat_messages
            WHERE chat_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(chat_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}

#[async_trait]
impl MessageStore for PgChatRepository {
    async fn count_messages_after(
        &self,
        conversation_id: i64,
        exclude_sender_id: i64,
        after_message_id: Option<i64>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM chat_messages
            WHERE chat_id = $1
              AND sender_id <> $2
              AND ($3::BIGINT IS NULL OR id > $3)
            "#,
        )
        .bind(conversation_id)
        .bind(exclude_sender_id)
        .bind(after_message_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl ConversationDirectory for PgChatRepository {
    async fn list_conversations_for(&self, participant_id: i64) -> AppResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM chats WHERE user1_id = $1 OR user2_id = $1 ORDER BY id",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
