use async_trait::async_trait;
use error_types::error_codes;
use sqlx::PgPool;
use tracing::debug;

use super::violated_constraint;
use crate::error::{AppError, AppResult};
use crate::models::{Connection, ConnectionStatus};
use crate::repository::ConnectionRepository;

const CONNECTION_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgConnectionRepository {
    pool: PgPool,
}

impl PgConnectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn find_directed(
        &self,
        sender_id: i64,
        receiver_id: i64,
    ) -> AppResult<Option<Connection>> {
        let sql = format!(
            "SELECT {} FROM connections WHERE sender_id = $1 AND receiver_id = $2",
            CONNECTION_COLUMNS
        );
        let connection = sqlx::query_as::<_, Connection>(&sql)
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(connection)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Connection>> {
        let sql = format!("SELECT {} FROM connections WHERE id = $1", CONNECTION_COLUMNS);
        let connection = sqlx::query_as::<_, Connection>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(connection)
    }

    async fn create_pending(&self, sender_id: i64, receiver_id: i64) -> AppResult<Connection> {
        let sql = format!(
            "INSERT INTO connections (sender_id, receiver_id, status) \
             VALUES ($1, $2, 'PENDING') RETURNING {}",
            CONNECTION_COLUMNS
        );
        let connection = sqlx::query_as::<_, Connection>(&sql)
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match violated_constraint(&err) {
                Some("connections_pair_key") => AppError::conflict(
                    error_codes::CONNECTION_CONFLICT,
                    "Connection request already sent",
                ),
                _ => err.into(),
            })?;

        debug!(
            connection_id = connection.id,
            sender_id, receiver_id, "created connection request"
        );
        Ok(connection)
    }

    async fn transition(
        &self,
        id: i64,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> AppResult<Option<Connection>> {
        let sql = format!(
            "UPDATE connections SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {}",
            CONNECTION_COLUMNS
        );
        let connection = sqlx::query_as::<_, Connection>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;
        Ok(connection)
    }

    async fn list_accepted(&self, user_id: i64) -> AppResult<Vec<Connection>> {
        let sql = format!(
            "SELECT {} FROM connections \
             WHERE (sender_id = $1 OR receiver_id = $1) AND status = 'ACCEPTED' \
             ORDER BY updated_at DESC, id DESC",
            CONNECTION_COLUMNS
        );
        let connections = sqlx::query_as::<_, Connection>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(connections)
    }

    async fn list_incoming_pending(&self, user_id: i64) -> AppResult<Vec<Connection>> {
        let sql = format!(
            "SELECT {} FROM connections \
             WHERE receiver_id = $1 AND status = 'PENDING' \
             ORDER BY created_at DESC, id DESC",
            CONNECTION_COLUMNS
        );
        let connections = sqlx::query_as::<_, Connection>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(connections)
    }
}
