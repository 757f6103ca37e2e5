/// Account queries for auth and profiles
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ProfileUpdate, User};

const USER_COLUMNS: &str = "id, email, username, password_hash, google_id, first_name, last_name, \
     bio, location, avatar_url, role, view_email_status, view_location_status, \
     view_connections_status, created_at, updated_at";

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Emails are stored lowercased
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

pub async fn find_by_google_id(
    pool: &PgPool,
    google_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
    ))
    .bind(google_id)
    .fetch_optional(pool)
    .await
}

/// Insert a password account. Returns `None` when the email is taken.
pub async fn create_local(
    pool: &PgPool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, email, username, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(email.to_lowercase())
    .bind(username)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
}

/// Insert an account backed by a Google identity
pub async fn create_google(
    pool: &PgPool,
    email: &str,
    username: &str,
    google_id: &str,
    avatar_url: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, email, username, google_id, avatar_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(email.to_lowercase())
    .bind(username)
    .bind(google_id)
    .bind(avatar_url)
    .fetch_one(pool)
    .await
}

pub async fn link_google(
    pool: &PgPool,
    user_id: Uuid,
    google_id: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET google_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(google_id)
    .fetch_one(pool)
    .await
}

/// Apply the fields present in `update`; absent fields keep their value.
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    update: &ProfileUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            username = COALESCE($2, username),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            bio = COALESCE($5, bio),
            location = COALESCE($6, location),
            avatar_url = COALESCE($7, avatar_url),
            view_email_status = COALESCE($8, view_email_status),
            view_location_status = COALESCE($9, view_location_status),
            view_connections_status = COALESCE($10, view_connections_status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&update.username)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.bio)
    .bind(&update.location)
    .bind(&update.avatar_url)
    .bind(update.view_email_status)
    .bind(update.view_location_status)
    .bind(update.view_connections_status)
    .fetch_optional(pool)
    .await
}
