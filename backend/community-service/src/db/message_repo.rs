use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Message;

pub async fn insert_message(
    pool: &PgPool,
    sender_id: Uuid,
    recipient_id: Uuid,
    content: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, sender_id, recipient_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id, sender_id, recipient_id, content, created_at, read_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(sender_id)
    .bind(recipient_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Both directions between two users, newest first
pub async fn conversation(
    pool: &PgPool,
    a: Uuid,
    b: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, recipient_id, content, created_at, read_at
        FROM messages
        WHERE (sender_id = $1 AND recipient_id = $2)
           OR (sender_id = $2 AND recipient_id = $1)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Mark everything `sender_id` sent to `reader_id` as read
pub async fn mark_read(pool: &PgPool, reader_id: Uuid, sender_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE messages SET read_at = NOW()
        WHERE recipient_id = $1 AND sender_id = $2 AND read_at IS NULL
        "#,
    )
    .bind(reader_id)
    .bind(sender_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
