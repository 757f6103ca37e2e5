use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewNotification, Notification};
use crate::repository::NotificationRepository;

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, input: NewNotification) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, sender_id, kind, message, event_id, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING id, user_id, sender_id, kind, message, event_id, is_read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(input.sender_id)
        .bind(&input.kind)
        .bind(&input.message)
        .bind(input.event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, sender_id, kind, message, event_id, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_unread(&self, user_id: Uuid, sender_id: Uuid, kind: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE user_id = $1 AND sender_id = $2 AND kind = $3 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .bind(sender_id)
        .bind(kind)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
