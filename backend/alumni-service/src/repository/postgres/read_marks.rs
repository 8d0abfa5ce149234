use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{MarkUpdate, ReadMark};
use crate::repository::ReadMarkStore;

#[derive(Clone)]
pub struct PgReadMarkStore {
    pool: PgPool,
}

impl PgReadMarkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadMarkStore for PgReadMarkStore {
    async fn load(&self, conversation_id: i64, participant_id: i64) -> AppResult<Option<ReadMark>> {
        let mark = sqlx::query_as::<_, ReadMark>(
            r#"
            SELECT chat_id, user_id, last_read_message_id, updated_at
            FROM chat_read_states
            WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mark)
    }

    async fn advance(
        &self,
        conversation_id: i64,
        participant_id: i64,
        message_id: i64,
    ) -> AppResult<MarkUpdate> {
        // Single statement: the row lock taken by ON CONFLICT serialises
        // concurrent writers, and the WHERE clause keeps the greater id.
        let advanced = sqlx::query_as::<_, ReadMark>(
            r#"
            INSERT INTO chat_read_states (chat_id, user_id, last_read_message_id, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (chat_id, user_id) DO UPDATE
                SET last_read_message_id = EXCLUDED.last_read_message_id,
                    updated_at = NOW()
                WHERE chat_read_states.last_read_message_id IS NULL
                   OR chat_read_states.last_read_message_id < EXCLUDED.last_read_message_id
            RETURNING chat_id, user_id, last_read_message_id, updated_at
            "#,
        )
        .bind(conversation_id)
        .bind(participant_id)
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(mark) = advanced {
            return Ok(MarkUpdate {
                mark,
                advanced: true,
            });
        }

        let mark = self
            .load(conversation_id, participant_id)
            .await?
            .unwrap_or_else(|| ReadMark::never_read(conversation_id, participant_id));
        Ok(MarkUpdate {
            mark,
            advanced: false,
        })
    }
}
