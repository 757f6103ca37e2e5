use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Like;

/// Returns `None` if the user already liked the comment
pub async fn create_like(
    pool: &PgPool,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<Option<Like>, sqlx::Error> {
    sqlx::query_as::<_, Like>(
        r#"
        INSERT INTO likes (id, user_id, comment_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, comment_id) DO NOTHING
        RETURNING id, user_id, comment_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_like(
    pool: &PgPool,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND comment_id = $2")
        .bind(user_id)
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_likes(pool: &PgPool, comment_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE comment_id = $1")
        .bind(comment_id)
        .fetch_one(pool)
        .await
}
