/// Notification dispatcher
///
/// Stores notifications and pushes them to live sockets. Storage and push are
/// independent: a notification for an offline user stays unread until fetched.
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{NewNotification, Notification};
use crate::repository::{EventRepository, NotificationRepository, UserRepository};
use crate::websocket::{LiveEvent, LivePush};

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
    live: Arc<dyn LivePush>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        live: Arc<dyn LivePush>,
    ) -> Self {
        Self {
            notifications,
            users,
            events,
            live,
        }
    }

    /// Persist an unread notification for `user_id`.
    pub async fn create(
        &self,
        user_id: Uuid,
        sender_id: Uuid,
        kind: &str,
        message: impl Into<String>,
        event_id: Option<Uuid>,
    ) -> Result<Notification> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound(format!("user {user_id}")));
        }
        if let Some(event_id) = event_id {
            if self.events.find(event_id).await?.is_none() {
                return Err(AppError::NotFound(format!("event {event_id}")));
            }
        }

        self.notifications
            .insert(NewNotification {
                user_id,
                sender_id,
                kind: kind.to_string(),
                message: message.into(),
                event_id,
            })
            .await
    }

    /// Best-effort live delivery. Never fails: an offline user is a no-op and
    /// transport errors are only logged.
    pub async fn push(&self, user_id: Uuid, sender_id: Uuid, event: LiveEvent) {
        if let Err(e) = self.live.push(user_id, &event).await {
            warn!(
                user_id = %user_id,
                sender_id = %sender_id,
                error = %e,
                "live push failed"
            );
        }
    }

    /// Store a notification, then push it to the owner's sockets.
    pub async fn dispatch(
        &self,
        user_id: Uuid,
        sender_id: Uuid,
        kind: &str,
        message: impl Into<String>,
        event_id: Option<Uuid>,
    ) -> Result<Notification> {
        let notification = self
            .create(user_id, sender_id, kind, message, event_id)
            .await?;
        debug!(
            notification_id = %notification.id,
            user_id = %user_id,
            kind,
            "notification stored"
        );

        self.push(
            user_id,
            sender_id,
            LiveEvent::notification(notification.clone()),
        )
        .await;

        Ok(notification)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        self.notifications
            .list(user_id, unread_only, limit, offset)
            .await
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        if !self.notifications.mark_read(user_id, notification_id).await? {
            return Err(AppError::NotFound(format!(
                "notification {notification_id}"
            )));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        self.notifications.mark_all_read(user_id).await
    }

    pub async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        if !self.notifications.delete(user_id, notification_id).await? {
            return Err(AppError::NotFound(format!(
                "notification {notification_id}"
            )));
        }
        Ok(())
    }

    /// Drop the unread notifications of `kind` that `sender_id` sent to `user_id`.
    pub async fn retract(&self, user_id: Uuid, sender_id: Uuid, kind: &str) -> Result<u64> {
        self.notifications
            .delete_unread(user_id, sender_id, kind)
            .await
    }
}
