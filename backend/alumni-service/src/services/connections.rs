use error_types::error_codes;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{Connection, ConnectionStatus};
use crate::repository::{ConnectionRepository, UserRepository};

pub const REQUEST_SENT: &str = "Connection request sent successfully";

pub struct ConnectionService {
    connections: Arc<dyn ConnectionRepository>,
    users: Arc<dyn UserRepository>,
}

fn already_connected() -> AppError {
    AppError::conflict(error_codes::CONNECTION_CONFLICT, "User is already connected")
}

impl ConnectionService {
    pub fn new(connections: Arc<dyn ConnectionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { connections, users }
    }

    /// Send a request from `sender_id` to `receiver_id`, checking both
    /// directions for an existing relationship first.
    pub async fn send_request(&self, sender_id: i64, receiver_id: i64) -> AppResult<Connection> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "You cannot send a connection request to yourself".to_string(),
            ));
        }
        for user_id in [sender_id, receiver_id] {
            if !self.users.exists(user_id).await? {
                return Err(AppError::user_not_found(user_id));
            }
        }

        let (forward, reverse) = self.connections.find_between(sender_id, receiver_id).await?;

        if let Some(existing) = forward {
            return match existing.status {
                ConnectionStatus::Accepted => Err(already_connected()),
                ConnectionStatus::Pending => Err(AppError::conflict(
                    error_codes::CONNECTION_CONFLICT,
                    "Connection request already sent",
                )),
                ConnectionStatus::Rejected => {
                    if let Some(reverse) = &reverse {
                        check_reverse(reverse)?;
                    }
                    // A rejected request may be sent again.
                    let resent = self
                        .connections
                        .transition(existing.id, ConnectionStatus::Rejected, ConnectionStatus::Pending)
                        .await?
                        .ok_or_else(|| {
                            AppError::conflict(
                                error_codes::CONNECTION_CONFLICT,
                                "Connection request already sent",
                            )
                        })?;
                    info!(connection_id = resent.id, sender_id, receiver_id, "connection request re-sent");
                    Ok(resent)
                }
            };
        }

        if let Some(reverse) = &reverse {
            check_reverse(reverse)?;
        }

        let created = self.connections.create_pending(sender_id, receiver_id).await?;
        info!(connection_id = created.id, sender_id, receiver_id, "connection request sent");
        Ok(created)
    }

    pub async fn accept(&self, connection_id: i64, acting_user_id: i64) -> AppResult<Connection> {
        self.respond(connection_id, acting_user_id, ConnectionStatus::Accepted)
            .await
    }

    pub async fn reject(&self, connection_id: i64, acting_user_id: i64) -> AppResult<Connection> {
        self.respond(connection_id, acting_user_id, ConnectionStatus::Rejected)
            .await
    }

    async fn respond(
        &self,
        connection_id: i64,
        acting_user_id: i64,
        answer: ConnectionStatus,
    ) -> AppResult<Connection> {
        let connection = self
            .connections
            .find_by_id(connection_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    error_codes::CONNECTION_NOT_FOUND,
                    format!("Connection request not found with id: {}", connection_id),
                )
            })?;

        if connection.receiver_id != acting_user_id {
            return Err(AppError::Forbidden(
                "Only the receiver can respond to a connection request".to_string(),
            ));
        }

        let not_pending = || {
            AppError::conflict(
                error_codes::CONNECTION_CONFLICT,
                "Connection request is no longer pending",
            )
        };
        if connection.status != ConnectionStatus::Pending {
            return Err(not_pending());
        }

        let updated = self
            .connections
            .transition(connection_id, ConnectionStatus::Pending, answer)
            .await?
            .ok_or_else(not_pending)?;

        info!(connection_id, status = answer.as_str(), "connection request answered");
        Ok(updated)
    }

    pub async fn list_connections(&self, user_id: i64) -> AppResult<Vec<Connection>> {
        self.ensure_user(user_id).await?;
        self.connections.list_accepted(user_id).await
    }

    pub async fn list_pending(&self, user_id: i64) -> AppResult<Vec<Connection>> {
        self.ensure_user(user_id).await?;
        self.connections.list_incoming_pending(user_id).await
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        if self.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::user_not_found(user_id))
        }
    }
}

/// A request in the opposite direction blocks a new one unless it was rejected.
fn check_reverse(reverse: &Connection) -> AppResult<()> {
    match reverse.status {
        ConnectionStatus::Accepted => Err(already_connected()),
        ConnectionStatus::Pending => Err(AppError::conflict(
            error_codes::CONNECTION_CONFLICT,
            "Receiver has already sent you a request. Please accept it instead.",
        )),
        ConnectionStatus::Rejected => Ok(()),
    }
}
