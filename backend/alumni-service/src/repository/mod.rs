//! Storage seams.
//!
//! Every table is reached through one of the traits below. `postgres` holds
//! the sqlx implementations used in production; `memory` holds an in-process
//! implementation of all of them used by tests and `STORAGE_BACKEND=memory`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{
    Chat, ChatMessage, Comment, Connection, ConnectionStatus, GroupChatDetails, GroupMessage,
    JobPost, MarkUpdate, NewComment, NewGroupChat, NewGroupMessage, NewJobPost, NewUser,
    PageRequest, Participant, PostSearchCriteria, ReadMark, UpdateProfileRequest, User,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Duplicate username or email is a conflict.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// All users ordered by id
    async fn list_all(&self) -> AppResult<Vec<User>>;

    /// Apply a partial profile update; `None` when the user does not exist.
    async fn update_profile(
        &self,
        id: i64,
        update: &UpdateProfileRequest,
        mark_completed: bool,
    ) -> AppResult<Option<User>>;

    /// Case-insensitive substring match on username or name, ordered by username.
    async fn search(&self, fragment: &str) -> AppResult<Vec<User>>;

    /// How many of `ids` exist. `ids` must be free of duplicates.
    async fn count_existing(&self, ids: &[i64]) -> AppResult<i64>;

    async fn exists(&self, id: i64) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// The request sent from `sender_id` to `receiver_id`, in that direction only.
    async fn find_directed(&self, sender_id: i64, receiver_id: i64)
        -> AppResult<Option<Connection>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Connection>>;

    /// Insert a PENDING request. A concurrent duplicate is a conflict.
    async fn create_pending(&self, sender_id: i64, receiver_id: i64) -> AppResult<Connection>;

    /// Move a request to `to` only if it is currently in `from`.
    /// `None` when the request was not in `from` anymore.
    async fn transition(
        &self,
        id: i64,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> AppResult<Option<Connection>>;

    /// Accepted connections in either direction, newest first
    async fn list_accepted(&self, user_id: i64) -> AppResult<Vec<Connection>>;

    /// Pending requests addressed to `user_id`, newest first
    async fn list_incoming_pending(&self, user_id: i64) -> AppResult<Vec<Connection>>;

    /// Both directions between two users: (a→b, b→a)
    async fn find_between(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> AppResult<(Option<Connection>, Option<Connection>)> {
        let forward = self.find_directed(user_a, user_b).await?;
        let reverse = self.find_directed(user_b, user_a).await?;
        Ok((forward, reverse))
    }
}

#[async_trait]
pub trait JobPostRepository: Send + Sync {
    async fn create(&self, post: NewJobPost) -> AppResult<JobPost>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<JobPost>>;

    /// Posts of one author, newest first
    async fn list_by_username(&self, username: &str) -> AppResult<Vec<JobPost>>;

    /// One page of matches, newest first, with the total match count.
    async fn search(&self, criteria: &PostSearchCriteria) -> AppResult<(Vec<JobPost>, i64)>;

    /// Record a like. `false` when the user had already liked the post.
    async fn add_like(&self, post_id: i64, user_id: i64) -> AppResult<bool>;

    /// Delete a post with its likes and comments. `false` when it did not exist.
    async fn delete(&self, post_id: i64) -> AppResult<bool>;

    async fn add_comment(&self, comment: NewComment) -> AppResult<Comment>;

    /// Comments of a post, oldest first
    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>>;
}

#[async_trait]
pub trait GroupChatRepository: Send + Sync {
    /// Insert the group and all its participants atomically.
    async fn create(&self, group: NewGroupChat) -> AppResult<GroupChatDetails>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<GroupChatDetails>>;

    /// Groups `user_id` participates in, newest first
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<GroupChatDetails>>;

    async fn find_participant(&self, group_id: i64, user_id: i64)
        -> AppResult<Option<Participant>>;

    async fn exists(&self, group_id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait GroupMessageRepository: Send + Sync {
    async fn create(&self, message: NewGroupMessage) -> AppResult<GroupMessage>;

    async fn find(&self, group_id: i64, message_id: i64) -> AppResult<Option<GroupMessage>>;

    /// One page of a group's messages, oldest first, with the total count.
    async fn list_page(
        &self,
        group_id: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<GroupMessage>, i64)>;

    async fn delete(&self, message_id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Existing chat for the pair, or a new one. Safe under concurrent calls.
    async fn find_or_create(&self, user_a: i64, user_b: i64) -> AppResult<Chat>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Chat>>;

    /// Chats of `user_id` ordered by chat id
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Chat>>;

    async fn create_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        content: &str,
    ) -> AppResult<ChatMessage>;

    /// Newest first, ids strictly below `before` when given.
    async fn list_messages(
        &self,
        chat_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>>;
}

/// Message stream consulted for unread counts.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages in `conversation_id` not sent by `exclude_sender_id` with an id
    /// greater than `after_message_id`, or all of them when it is `None`.
    async fn count_messages_after(
        &self,
        conversation_id: i64,
        exclude_sender_id: i64,
        after_message_id: Option<i64>,
    ) -> AppResult<i64>;
}

/// Resolves which conversations a participant belongs to.
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    async fn list_conversations_for(&self, participant_id: i64) -> AppResult<Vec<i64>>;
}

/// Storage of read marks, one per (conversation, participant).
#[async_trait]
pub trait ReadMarkStore: Send + Sync {
    async fn load(&self, conversation_id: i64, participant_id: i64)
        -> AppResult<Option<ReadMark>>;

    /// Atomically store `message_id` if no mark exists or it is greater than
    /// the stored one. Concurrent calls on one pair keep the maximum.
    async fn advance(
        &self,
        conversation_id: i64,
        participant_id: i64,
        message_id: i64,
    ) -> AppResult<MarkUpdate>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub connections: Arc<dyn ConnectionRepository>,
    pub job_posts: Arc<dyn JobPostRepository>,
    pub group_chats: Arc<dyn GroupChatRepository>,
    pub group_messages: Arc<dyn GroupMessageRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub messages: Arc<dyn MessageStore>,
    pub directory: Arc<dyn ConversationDirectory>,
    pub read_marks: Arc<dyn ReadMarkStore>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let chats = Arc::new(postgres::PgChatRepository::new(pool.clone()));
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            connections: Arc::new(postgres::PgConnectionRepository::new(pool.clone())),
            job_posts: Arc::new(postgres::PgJobPostRepository::new(pool.clone())),
            group_chats: Arc::new(postgres::PgGroupChatRepository::new(pool.clone())),
            group_messages: Arc::new(postgres::PgGroupMessageRepository::new(pool.clone())),
            messages: chats.clone(),
            directory: chats.clone(),
            chats,
            read_marks: Arc::new(postgres::PgReadMarkStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(memory::MemoryStore::new()))
    }

    /// Share one store so tests can seed it directly.
    pub fn from_memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            connections: store.clone(),
            job_posts: store.clone(),
            group_chats: store.clone(),
            group_messages: store.clone(),
            chats: store.clone(),
            messages: store.clone(),
            directory: store.clone(),
            read_marks: store,
        }
    }
}
