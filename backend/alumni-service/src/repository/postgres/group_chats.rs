use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;

use crate::error::AppResult;
use crate::models::{GroupChat, GroupChatDetails, NewGroupChat, Participant};
use crate::repository::GroupChatRepository;

#[derive(Clone)]
pub struct PgGroupChatRepository {
    pool: PgPool,
}

impl PgGroupChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn participants_of(&self, group_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Participant>>> {
        let rows = sqlx::query_as::<_, Participant>(
            r#"
            SELECT group_id, user_id, username, role
            FROM group_participants
            WHERE group_id = ANY($1)
            ORDER BY group_id, (role = 'OWNER') DESC, user_id
            "#,
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_group: HashMap<i64, Vec<Participant>> = HashMap::new();
        for participant in rows {
            by_group
                .entry(participant.group_id)
                .or_default()
                .push(participant);
        }
        Ok(by_group)
    }
}

#[async_trait]
impl GroupChatRepository for PgGroupChatRepository {
    async fn create(&self, group: NewGroupChat) -> AppResult<GroupChatDetails> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, GroupChat>(
            r#"
            INSERT INTO group_chats (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at
            "#,
        )
        .bind(&group.name)
        .bind(group.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut participants = Vec::with_capacity(group.participants.len());
        for p in &group.participants {
            let participant = sqlx::query_as::<_, Participant>(
                r#"
                INSERT INTO group_participants (group_id, user_id, username, role)
                VALUES ($1, $2, $3, $4)
                RETURNING group_id, user_id, username, role
                "#,
            )
            .bind(created.id)
            .bind(p.user_id)
            .bind(&p.username)
            .bind(p.role)
            .fetch_one(&mut *tx)
            .await?;
            participants.push(participant);
        }

        tx.commit().await?;

        debug!(
            group_id = created.id,
            participants = participants.len(),
            "created group chat"
        );
        Ok(GroupChatDetails {
            group: created,
            participants,
        })
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<GroupChatDetails>> {
        let group = sqlx::query_as::<_, GroupChat>(
            "SELECT id, name, owner_id, created_at FROM group_chats WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(group) = group else {
            return Ok(None);
        };
        let mut participants = self.participants_of(&[group.id]).await?;
        Ok(Some(GroupChatDetails {
            participants: participants.remove(&group.id).unwrap_or_default(),
            group,
        }))
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<GroupChatDetails>> {
        let groups = sqlx::query_as::<_, GroupChat>(
            r#"
            SELECT g.id, g.name, g.owner_id, g.created_at
            FROM group_chats g
            JOIN group_participants gp ON gp.group_id = g.id
            WHERE gp.user_id = $1
            ORDER BY g.created_at DESC, g.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        let mut participants = self.participants_of(&ids).await?;
        Ok(groups
            .into_iter()
            .map(|group| GroupChatDetails {
                participants: participants.remove(&group.id).unwrap_or_default(),
                group,
            })
            .collect())
    }

    async fn find_participant(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> AppResult<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT group_id, user_id, username, role
            FROM group_participants
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    async fn exists(&self, group_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM group_chats WHERE id = $1)")
                .bind(group_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
