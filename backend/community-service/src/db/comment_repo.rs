use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Comment, CommentTarget};

pub async fn create_comment(
    pool: &PgPool,
    user_id: Uuid,
    target: CommentTarget,
    parent_id: Option<Uuid>,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (id, user_id, group_id, event_id, parent_id, content)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, group_id, event_id, parent_id, content, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(target.group_id())
    .bind(target.event_id())
    .bind(parent_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn find_comment(pool: &PgPool, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, user_id, group_id, event_id, parent_id, content, created_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Oldest first so threads read top-down
pub async fn list_by_target(
    pool: &PgPool,
    target: CommentTarget,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, user_id, group_id, event_id, parent_id, content, created_at
        FROM comments
        WHERE ($1::uuid IS NOT NULL AND group_id = $1)
           OR ($2::uuid IS NOT NULL AND event_id = $2)
        ORDER BY created_at
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(target.group_id())
    .bind(target.event_id())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Delete a comment owned by `user_id`. Replies cascade.
pub async fn delete_comment(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
        .bind(comment_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn group_exists(pool: &PgPool, group_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1)")
        .bind(group_id)
        .fetch_one(pool)
        .await
}

pub async fn event_exists(pool: &PgPool, event_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
        .bind(event_id)
        .fetch_one(pool)
        .await
}
