use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::USER_SUMMARY_COLUMNS;
use crate::error::Result;
use crate::models::{Group, NewGroup, UserSummary};
use crate::repository::GroupRepository;

#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn create(&self, input: NewGroup, creator_id: Uuid) -> Result<Group> {
        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (id, name, description, is_open, category, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, is_open, category, location, is_approved, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.is_open)
        .bind(&input.category)
        .bind(&input.location)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_admins (group_id, user_id) VALUES ($1, $2)")
            .bind(group.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(group.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(group)
    }

    async fn find(&self, group_id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, description, is_open, category, location, is_approved, created_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, description, is_open, category, location, is_approved, created_at
            FROM groups
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_admins WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn members(&self, group_id: Uuid) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            r#"
            SELECT {USER_SUMMARY_COLUMNS}
            FROM group_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.group_id = $1
            ORDER BY m.joined_at
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
