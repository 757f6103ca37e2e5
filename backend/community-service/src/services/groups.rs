/// Group membership and group directory
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{Group, NewGroup, UserSummary};
use crate::repository::{GroupRepository, UserRepository};

#[derive(Clone)]
pub struct GroupMembership {
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

impl GroupMembership {
    pub fn new(groups: Arc<dyn GroupRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { groups, users }
    }

    async fn require_group(&self, group_id: Uuid) -> Result<Group> {
        self.groups
            .find(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {group_id}")))
    }

    /// Add `user_id` to the group. Joining twice is a no-op.
    pub async fn join(&self, group_id: Uuid, user_id: Uuid) -> Result<()> {
        self.require_group(group_id).await?;
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound(format!("user {user_id}")));
        }

        if self.groups.add_member(group_id, user_id).await? {
            info!(group_id = %group_id, user_id = %user_id, "user joined group");
        }
        Ok(())
    }

    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<()> {
        if !self.groups.remove_member(group_id, user_id).await? {
            return Err(AppError::NotFound("user is not a member of this group".into()));
        }
        info!(group_id = %group_id, user_id = %user_id, "user left group");
        Ok(())
    }

    /// Create a group; the creator becomes its first admin and member.
    pub async fn create_group(&self, creator_id: Uuid, input: NewGroup) -> Result<Group> {
        input.validate()?;
        if !self.users.exists(creator_id).await? {
            return Err(AppError::NotFound(format!("user {creator_id}")));
        }

        let group = self.groups.create(input, creator_id).await?;
        info!(group_id = %group.id, creator_id = %creator_id, "group created");
        Ok(group)
    }

    pub async fn get(&self, group_id: Uuid) -> Result<Group> {
        self.require_group(group_id).await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Group>> {
        self.groups.list(limit, offset).await
    }

    pub async fn members(&self, group_id: Uuid) -> Result<Vec<UserSummary>> {
        self.require_group(group_id).await?;
        self.groups.members(group_id).await
    }

    pub async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.groups.is_member(group_id, user_id).await
    }

    pub async fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.groups.is_admin(group_id, user_id).await
    }
}
