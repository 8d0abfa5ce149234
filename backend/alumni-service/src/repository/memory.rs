//! In-process storage backend.
//!
//! Holds every table behind one `RwLock`, so each trait method is atomic
//! with respect to the others. Selected with `STORAGE_BACKEND=memory` and
//! used throughout the tests.

use async_trait::async_trait;
use chrono::Utc;
use error_types::error_codes;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{
    ordered_pair, Chat, ChatMessage, Comment, Connection, ConnectionStatus, GroupChat,
    GroupChatDetails, GroupMessage, JobPost, MarkUpdate, NewComment, NewGroupChat,
    NewGroupMessage, NewJobPost, NewUser, PageRequest, Participant, ParticipantRole,
    PostSearchCriteria, ReadMark, UpdateProfileRequest, User,
};
use crate::repository::{
    ChatRepository, ConnectionRepository, ConversationDirectory, GroupChatRepository,
    GroupMessageRepository, JobPostRepository, MessageStore, ReadMarkStore, UserRepository,
};

#[derive(Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    user_ids: Sequence,

    connections: BTreeMap<i64, Connection>,
    connection_ids: Sequence,

    posts: BTreeMap<i64, JobPost>,
    post_ids: Sequence,
    likes: HashSet<(i64, i64)>,
    comments: BTreeMap<i64, Comment>,
    comment_ids: Sequence,

    groups: BTreeMap<i64, GroupChat>,
    group_ids: Sequence,
    participants: Vec<Participant>,
    group_messages: BTreeMap<i64, GroupMessage>,
    group_message_ids: Sequence,

    chats: BTreeMap<i64, Chat>,
    chat_ids: Sequence,
    chat_messages: BTreeMap<i64, ChatMessage>,
    chat_message_ids: Sequence,

    read_marks: HashMap<(i64, i64), ReadMark>,
}

impl Inner {
    fn with_like_count(&self, post: &JobPost) -> JobPost {
        let like_count = self
            .likes
            .iter()
            .filter(|(post_id, _)| *post_id == post.id)
            .count() as i64;
        JobPost {
            like_count,
            ..post.clone()
        }
    }

    fn participants_of(&self, group_id: i64) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self
            .participants
            .iter()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| (p.role != ParticipantRole::Owner, p.user_id));
        participants
    }

    fn group_details(&self, group: &GroupChat) -> GroupChatDetails {
        GroupChatDetails {
            group: group.clone(),
            participants: self.participants_of(group.id),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict(
                error_codes::USER_ALREADY_EXISTS,
                "Username already exists",
            ));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict(
                error_codes::USER_ALREADY_EXISTS,
                "Email already exists",
            ));
        }

        let now = Utc::now();
        let created = User {
            id: inner.user_ids.next(),
            username: user.username,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            profile_completed: false,
            profile: Default::default(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn update_profile(
        &self,
        id: i64,
        update: &UpdateProfileRequest,
        mark_completed: bool,
    ) -> AppResult<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            user.name = name.trim().to_string();
        }
        update.apply_to(&mut user.profile);
        user.profile_completed |= mark_completed;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn search(&self, fragment: &str) -> AppResult<Vec<User>> {
        let needle = fragment.to_lowercase();
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn count_existing(&self, ids: &[i64]) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter(|id| inner.users.contains_key(id)).count() as i64)
    }
}

#[async_trait]
impl ConnectionRepository for MemoryStore {
    async fn find_directed(
        &self,
        sender_id: i64,
        receiver_id: i64,
    ) -> AppResult<Option<Connection>> {
        let inner = self.inner.read().await;
        Ok(inner
            .connections
            .values()
            .find(|c| c.sender_id == sender_id && c.receiver_id == receiver_id)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Connection>> {
        Ok(self.inner.read().await.connections.get(&id).cloned())
    }

    async fn create_pending(&self, sender_id: i64, receiver_id: i64) -> AppResult<Connection> {
        let mut inner = self.inner.write().await;
        if inner
            .connections
            .values()
            .any(|c| c.sender_id == sender_id && c.receiver_id == receiver_id)
        {
            return Err(AppError::conflict(
                error_codes::CONNECTION_CONFLICT,
                "Connection request already sent",
            ));
        }

        let now = Utc::now();
        let connection = Connection {
            id: inner.connection_ids.next(),
            sender_id,
            receiver_id,
            status: ConnectionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    async fn transition(
        &self,
        id: i64,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> AppResult<Option<Connection>> {
        let mut inner = self.inner.write().await;
        match inner.connections.get_mut(&id) {
            Some(connection) if connection.status == from => {
                connection.status = to;
                connection.updated_at = Utc::now();
                Ok(Some(connection.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_accepted(&self, user_id: i64) -> AppResult<Vec<Connection>> {
        let inner = self.inner.read().await;
        let mut connections: Vec<Connection> = inner
            .connections
            .values()
            .filter(|c| {
                c.status == ConnectionStatus::Accepted
                    && (c.sender_id == user_id || c.receiver_id == user_id)
            })
            .cloned()
            .collect();
        connections.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)));
        Ok(connections)
    }

    async fn list_incoming_pending(&self, user_id: i64) -> AppResult<Vec<Connection>> {
        let inner = self.inner.read().await;
        let mut connections: Vec<Connection> = inner
            .connections
            .values()
            .filter(|c| c.status == ConnectionStatus::Pending && c.receiver_id == user_id)
            .cloned()
            .collect();
        connections.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(connections)
    }
}

#[async_trait]
impl JobPostRepository for MemoryStore {
    async fn create(&self, post: NewJobPost) -> AppResult<JobPost> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let created = JobPost {
            id: inner.post_ids.next(),
            username: post.username,
            description: post.description,
            image_urls: post.image_urls,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<JobPost>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&id).map(|p| inner.with_like_count(p)))
    }

    async fn list_by_username(&self, username: &str) -> AppResult<Vec<JobPost>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<JobPost> = inner
            .posts
            .values()
            .filter(|p| p.username == username)
            .map(|p| inner.with_like_count(p))
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts)
    }

    async fn search(&self, criteria: &PostSearchCriteria) -> AppResult<(Vec<JobPost>, i64)> {
        let inner = self.inner.read().await;
        let mut matches: Vec<&JobPost> =
            inner.posts.values().filter(|p| criteria.matches(p)).collect();
        matches.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(criteria.page.offset() as usize)
            .take(criteria.page.size as usize)
            .map(|p| inner.with_like_count(p))
            .collect();
        Ok((page, total))
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> AppResult<bool> {
        Ok(self.inner.write().await.likes.insert((post_id, user_id)))
    }

    async fn delete(&self, post_id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        inner.likes.retain(|(id, _)| *id != post_id);
        inner.comments.retain(|_, c| c.post_id != post_id);
        Ok(true)
    }

    async fn add_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let mut inner = self.inner.write().await;
        let created = Comment {
            id: inner.comment_ids.next(),
            post_id: comment.post_id,
            user_id: comment.user_id,
            username: comment.username,
            content: comment.content,
            created_at: Utc::now(),
        };
        inner.comments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GroupChatRepository for MemoryStore {
    async fn create(&self, group: NewGroupChat) -> AppResult<GroupChatDetails> {
        let mut inner = self.inner.write().await;
        let created = GroupChat {
            id: inner.group_ids.next(),
            name: group.name,
            owner_id: group.owner_id,
            created_at: Utc::now(),
        };
        for p in group.participants {
            inner.participants.push(Participant {
                group_id: created.id,
                user_id: p.user_id,
                username: p.username,
                role: p.role,
            });
        }
        inner.groups.insert(created.id, created.clone());
        Ok(inner.group_details(&created))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<GroupChatDetails>> {
        let inner = self.inner.read().await;
        Ok(inner.groups.get(&id).map(|g| inner.group_details(g)))
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<GroupChatDetails>> {
        let inner = self.inner.read().await;
        let mut groups: Vec<&GroupChat> = inner
            .groups
            .values()
            .filter(|g| {
                inner
                    .participants
                    .iter()
                    .any(|p| p.group_id == g.id && p.user_id == user_id)
            })
            .collect();
        groups.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(groups.into_iter().map(|g| inner.group_details(g)).collect())
    }

    async fn find_participant(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> AppResult<Option<Participant>> {
        let inner = self.inner.read().await;
        Ok(inner
            .participants
            .iter()
            .find(|p| p.group_id == group_id && p.user_id == user_id)
            .cloned())
    }

    async fn exists(&self, group_id: i64) -> AppResult<bool> {
        Ok(self.inner.read().await.groups.contains_key(&group_id))
    }
}

#[async_trait]
impl GroupMessageRepository for MemoryStore {
    async fn create(&self, message: NewGroupMessage) -> AppResult<GroupMessage> {
        let mut inner = self.inner.write().await;
        let created = GroupMessage {
            id: inner.group_message_ids.next(),
            group_id: message.group_id,
            sender_id: message.sender_id,
            sender_username: message.sender_username,
            content: message.content,
            created_at: Utc::now(),
        };
        inner.group_messages.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find(&self, group_id: i64, message_id: i64) -> AppResult<Option<GroupMessage>> {
        let inner = self.inner.read().await;
        Ok(inner
            .group_messages
            .get(&message_id)
            .filter(|m| m.group_id == group_id)
            .cloned())
    }

    async fn list_page(
        &self,
        group_id: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<GroupMessage>, i64)> {
        let inner = self.inner.read().await;
        let mut messages: Vec<&GroupMessage> = inner
            .group_messages
            .values()
            .filter(|m| m.group_id == group_id)
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));

        let total = messages.len() as i64;
        let content = messages
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok((content, total))
    }

    async fn delete(&self, message_id: i64) -> AppResult<bool> {
        Ok(self
            .inner
            .write()
            .await
            .group_messages
            .remove(&message_id)
            .is_some())
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn find_or_create(&self, user_a: i64, user_b: i64) -> AppResult<Chat> {
        let (user1_id, user2_id) = ordered_pair(user_a, user_b);
        let mut inner = self.inner.write().await;
        if let Some(chat) = inner
            .chats
            .values()
            .find(|c| c.user1_id == user1_id && c.user2_id == user2_id)
        {
            return Ok(chat.clone());
        }

        let chat = Chat {
            id: inner.chat_ids.next(),
            user1_id,
            user2_id,
            created_at: Utc::now(),
        };
        inner.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Chat>> {
        Ok(self.inner.read().await.chats.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Chat>> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .values()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn create_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        content: &str,
    ) -> AppResult<ChatMessage> {
        let mut inner = self.inner.write().await;
        let message = ChatMessage {
            id: inner.chat_message_ids.next(),
            chat_id,
            sender_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.chat_messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        chat_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>> {
        let inner = self.inner.read().await;
        Ok(inner
            .chat_messages
            .values()
            .rev()
            .filter(|m| m.chat_id == chat_id && before.map(|b| m.id < b).unwrap_or(true))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn count_messages_after(
        &self,
        conversation_id: i64,
        exclude_sender_id: i64,
        after_message_id: Option<i64>,
    ) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .chat_messages
            .values()
            .filter(|m| {
                m.chat_id == conversation_id
                    && m.sender_id != exclude_sender_id
                    && after_message_id.map(|after| m.id > after).unwrap_or(true)
            })
            .count() as i64)
    }
}

#[async_trait]
impl ConversationDirectory for MemoryStore {
    async fn list_conversations_for(&self, participant_id: i64) -> AppResult<Vec<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .values()
            .filter(|c| c.has_participant(participant_id))
            .map(|c| c.id)
            .collect())
    }
}

#[async_trait]
impl ReadMarkStore for MemoryStore {
    async fn load(&self, conversation_id: i64, participant_id: i64) -> AppResult<Option<ReadMark>> {
        let inner = self.inner.read().await;
        Ok(inner
            .read_marks
            .get(&(conversation_id, participant_id))
            .cloned())
    }

    async fn advance(
        &self,
        conversation_id: i64,
        participant_id: i64,
        message_id: i64,
    ) -> AppResult<MarkUpdate> {
        // compare and set under one write guard
        let mut inner = self.inner.write().await;
        let mark = inner
            .read_marks
            .entry((conversation_id, participant_id))
            .or_insert_with(|| ReadMark::never_read(conversation_id, participant_id));

        let advanced = mark.would_advance(message_id);
        if advanced {
            mark.last_acknowledged_message_id = Some(message_id);
            mark.updated_at = Some(Utc::now());
        }
        Ok(MarkUpdate {
            mark: mark.clone(),
            advanced,
        })
    }
}
