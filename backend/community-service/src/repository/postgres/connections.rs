use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::USER_SUMMARY_COLUMNS;
use crate::error::Result;
use crate::models::{ConnectionRequest, UserSummary};
use crate::repository::ConnectionRepository;

#[derive(Clone)]
pub struct PgConnectionRepository {
    pool: PgPool,
}

impl PgConnectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serializes request creation and acceptance for one unordered pair until
/// the surrounding transaction ends.
async fn lock_pair(conn: &mut PgConnection, a: Uuid, b: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        SELECT pg_advisory_xact_lock(
            hashtextextended(LEAST($1::text, $2::text) || ':' || GREATEST($1::text, $2::text), 0)
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(conn)
    .await?;

    Ok(())
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn find_request(&self, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
        let request = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at
            FROM connection_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<ConnectionRequest>> {
        let request = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at
            FROM connection_requests
            WHERE status = 'pending'
              AND ((requester_id = $1 AND recipient_id = $2)
                OR (requester_id = $2 AND recipient_id = $1))
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<ConnectionRequest>> {
        let request = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at
            FROM connection_requests
            WHERE status = 'pending' AND requester_id = $1 AND recipient_id = $2
            "#,
        )
        .bind(requester_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn create_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<ConnectionRequest>> {
        let mut tx = self.pool.begin().await?;
        lock_pair(&mut tx, requester_id, recipient_id).await?;

        // The partial unique index over the unordered pair rejects a second pending request
        let request = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            INSERT INTO connection_requests (id, requester_id, recipient_id, status)
            SELECT $1, $2, $3, 'pending'
            WHERE NOT EXISTS (
                SELECT 1 FROM user_connections
                WHERE user_id = $2 AND connection_id = $3
            )
            ON CONFLICT DO NOTHING
            RETURNING id, requester_id, recipient_id, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(requester_id)
        .bind(recipient_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn delete_request(&self, request_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM connection_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn are_connected(&self, a: Uuid, b: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_connections WHERE user_id = $1 AND connection_id = $2)",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn accept_request(&self, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
        let mut tx = self.pool.begin().await?;

        let pair: Option<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT requester_id, recipient_id FROM connection_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((requester_id, recipient_id)) = pair else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Taken before the delete so a concurrent create_request cannot wait on
        // the deleted row while holding the pair lock
        lock_pair(&mut tx, requester_id, recipient_id).await?;

        let request = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            DELETE FROM connection_requests
            WHERE id = $1
            RETURNING id, requester_id, recipient_id, status, created_at
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO user_connections (user_id, connection_id)
            VALUES ($1, $2), ($2, $1)
            ON CONFLICT (user_id, connection_id) DO NOTHING
            "#,
        )
        .bind(request.requester_id)
        .bind(request.recipient_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    async fn unlink(&self, a: Uuid, b: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_connections
            WHERE (user_id = $1 AND connection_id = $2)
               OR (user_id = $2 AND connection_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn connections_of(&self, user_id: Uuid) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            r#"
            SELECT {USER_SUMMARY_COLUMNS}
            FROM user_connections c
            JOIN users u ON u.id = c.connection_id
            WHERE c.user_id = $1
            ORDER BY u.username
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn pending_for(&self, recipient_id: Uuid) -> Result<Vec<ConnectionRequest>> {
        let requests = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at
            FROM connection_requests
            WHERE status = 'pending' AND recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}
