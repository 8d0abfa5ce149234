use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{GroupMessage, NewGroupMessage, PageRequest};
use crate::repository::GroupMessageRepository;

#[derive(Clone)]
pub struct PgGroupMessageRepository {
    pool: PgPool,
}

impl PgGroupMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupMessageRepository for PgGroupMessageRepository {
    async fn create(&self, message: NewGroupMessage) -> AppResult<GroupMessage> {
        let message = sqlx::query_as::<_, GroupMessage>(
            r#"
            INSERT INTO group_messages (group_id, sender_id, sender_username, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, sender_id, sender_username, content, created_at
            "#,
        )
        .bind(message.group_id)
        .bind(message.sender_id)
        .bind(&message.sender_username)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn find(&self, group_id: i64, message_id: i64) -> AppResult<Option<GroupMessage>> {
        let message = sqlx::query_as::<_, GroupMessage>(
            r#"
            SELECT id, group_id, sender_id, sender_username, content, created_at
            FROM group_messages
            WHERE id = $1 AND group_id = $2
            "#,
        )
        .bind(message_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list_page(
        &self,
        group_id: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<GroupMessage>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_messages WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;

        let messages = sqlx::query_as::<_, GroupMessage>(
            r#"
            SELECT id, group_id, sender_id, sender_username, content, created_at
            FROM group_messages
            WHERE group_id = $1
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(group_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((messages, total))
    }

    async fn delete(&self, message_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM group_messages WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
