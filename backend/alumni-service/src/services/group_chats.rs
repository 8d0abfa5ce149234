use error_types::error_codes;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateGroupRequest, GroupChatDetails, NewGroupChat, NewParticipant, Participant,
    ParticipantRole,
};
use crate::repository::{GroupChatRepository, UserRepository};

pub struct GroupChatService {
    groups: Arc<dyn GroupChatRepository>,
    users: Arc<dyn UserRepository>,
}

impl GroupChatService {
    pub fn new(groups: Arc<dyn GroupChatRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { groups, users }
    }

    pub async fn create_group(&self, req: CreateGroupRequest) -> AppResult<GroupChatDetails> {
        req.validate()?;
        let owner_id = req
            .owner_id
            .ok_or_else(|| AppError::BadRequest("ownerId is required".to_string()))?;

        let mut seen = HashSet::new();
        let participants: Vec<NewParticipant> = req
            .participants
            .into_iter()
            .filter(|p| seen.insert(p.user_id))
            .map(|p| NewParticipant {
                role: if p.user_id == owner_id {
                    ParticipantRole::Owner
                } else {
                    ParticipantRole::Member
                },
                user_id: p.user_id,
                username: p.username.trim().to_string(),
            })
            .collect();

        if participants.len() < 2 {
            return Err(AppError::BadRequest(
                "A group needs at least 2 distinct participants".to_string(),
            ));
        }

        let ids: Vec<i64> = participants.iter().map(|p| p.user_id).collect();
        if self.users.count_existing(&ids).await? != ids.len() as i64 {
            return Err(AppError::BadRequest(
                "One or more users do not exist".to_string(),
            ));
        }
        if !ids.contains(&owner_id) {
            return Err(AppError::BadRequest(
                "Owner must be present in participants list".to_string(),
            ));
        }

        let group = self
            .groups
            .create(NewGroupChat {
                name: req.name.trim().to_string(),
                owner_id,
                participants,
            })
            .await?;

        info!(
            group_id = group.group.id,
            owner_id,
            participants = group.participants.len(),
            "group chat created"
        );
        Ok(group)
    }

    pub async fn get_group(&self, group_id: i64) -> AppResult<GroupChatDetails> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| group_not_found(group_id))
    }

    pub async fn groups_for_user(&self, user_id: i64) -> AppResult<Vec<GroupChatDetails>> {
        self.groups.list_for_user(user_id).await
    }

    /// The participant entry of `user_id`, or 404/403 for a missing group or
    /// a non-member.
    pub async fn require_member(&self, group_id: i64, user_id: i64) -> AppResult<Participant> {
        if !self.groups.exists(group_id).await? {
            return Err(group_not_found(group_id));
        }
        self.groups
            .find_participant(group_id, user_id)
            .await?
            .ok_or_else(AppError::not_a_member)
    }
}

pub(crate) fn group_not_found(group_id: i64) -> AppError {
    AppError::not_found(
        error_codes::GROUP_NOT_FOUND,
        format!("Group chat not found with id: {}", group_id),
    )
}
