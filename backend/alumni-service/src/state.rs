use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::repository::Repositories;
use crate::services::{
    ChatService, ConnectionService, GroupChatService, GroupMessageService, JobPostService,
    ReadReceiptTracker, UserService,
};
use crate::websocket::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when running on the in-memory store
    pub db: Option<PgPool>,
    pub registry: ConnectionRegistry,
    pub users: Arc<UserService>,
    pub connections: Arc<ConnectionService>,
    pub job_posts: Arc<JobPostService>,
    pub group_chats: Arc<GroupChatService>,
    pub group_messages: Arc<GroupMessageService>,
    pub chats: Arc<ChatService>,
    pub read_receipts: Arc<ReadReceiptTracker>,
}

impl AppState {
    /// Wire every service onto one set of repositories.
    pub fn new(
        config: Config,
        repos: Repositories,
        db: Option<PgPool>,
        registry: ConnectionRegistry,
    ) -> Self {
        let group_chats = Arc::new(GroupChatService::new(
            repos.group_chats.clone(),
            repos.users.clone(),
        ));

        Self {
            config: Arc::new(config),
            db,
            users: Arc::new(UserService::new(repos.users.clone())),
            connections: Arc::new(ConnectionService::new(
                repos.connections.clone(),
                repos.users.clone(),
            )),
            job_posts: Arc::new(JobPostService::new(
                repos.job_posts.clone(),
                repos.users.clone(),
            )),
            group_messages: Arc::new(GroupMessageService::new(
                repos.group_messages.clone(),
                group_chats.clone(),
                registry.clone(),
            )),
            group_chats,
            chats: Arc::new(ChatService::new(
                repos.chats.clone(),
                repos.users.clone(),
                registry.clone(),
            )),
            read_receipts: Arc::new(ReadReceiptTracker::new(
                repos.read_marks.clone(),
                repos.messages.clone(),
                repos.directory.clone(),
            )),
            registry,
        }
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            config,
            Repositories::in_memory(),
            None,
            ConnectionRegistry::new(),
        )
    }
}
