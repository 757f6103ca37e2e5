/// User profiles filtered by each field's visibility setting
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::{ProfileUpdate, User, UserProfile};
use crate::repository::ConnectionRepository;

#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
    connections: Arc<dyn ConnectionRepository>,
}

impl ProfileService {
    pub fn new(db: PgPool, connections: Arc<dyn ConnectionRepository>) -> Self {
        Self { db, connections }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        users::find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    async fn is_connection(&self, viewer: Option<Uuid>, user_id: Uuid) -> Result<bool> {
        match viewer {
            Some(viewer) if viewer != user_id => self.connections.are_connected(viewer, user_id).await,
            _ => Ok(false),
        }
    }

    pub async fn get(&self, viewer: Option<Uuid>, user_id: Uuid) -> Result<UserProfile> {
        let user = self.require_user(user_id).await?;
        let is_connection = self.is_connection(viewer, user_id).await?;
        Ok(user.profile_for(viewer, is_connection))
    }

    /// Whether `viewer` may list the connections of `user_id`
    pub async fn can_view_connections(&self, viewer: Option<Uuid>, user_id: Uuid) -> Result<bool> {
        let user = self.require_user(user_id).await?;
        let is_self = viewer == Some(user_id);
        let is_connection = self.is_connection(viewer, user_id).await?;
        Ok(user.view_connections_status.allows(is_self, is_connection))
    }

    pub async fn update(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        if let Some(username) = update.username.as_deref() {
            if username.trim().is_empty() || username.len() > 50 {
                return Err(AppError::InvalidInput(
                    "username must be 1 to 50 characters".into(),
                ));
            }
        }

        users::update_profile(&self.db, user_id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }
}
