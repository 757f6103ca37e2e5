/// Local email/password accounts and session tokens
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{hash_password, verify_password, JwtKeys};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// A signed-in user together with the token for their session
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(db: PgPool, keys: JwtKeys) -> Self {
        Self { db, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<Session> {
        req.validate()?;

        let hash = hash_password(&req.password)?;
        let user = users::create_local(&self.db, &req.email, req.username.trim(), &hash)
            .await?
            .ok_or_else(|| AppError::Conflict("email is already registered".into()))?;

        info!(user_id = %user.id, "user signed up");
        self.session_for(user)
    }

    pub async fn signin(&self, req: SigninRequest) -> Result<Session> {
        req.validate()?;

        let user = users::find_by_email(&self.db, &req.email).await?;
        let Some(user) = user else {
            return Err(invalid_credentials());
        };
        // Accounts created through Google have no password
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(invalid_credentials());
        };
        if !verify_password(&req.password, hash)? {
            warn!(user_id = %user.id, "failed sign-in attempt");
            return Err(invalid_credentials());
        }

        info!(user_id = %user.id, "user signed in");
        self.session_for(user)
    }

    pub async fn whoami(&self, user_id: Uuid) -> Result<User> {
        users::find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    pub fn session_for(&self, user: User) -> Result<Session> {
        let token = self.keys.issue(user.id, &user.email)?;
        Ok(Session { user, token })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid email or password".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_validation() {
        let bad = SignupRequest {
            email: "not-an-email".into(),
            username: "ada".into(),
            password: "longenough".into(),
        };
        assert!(bad.validate().is_err());

        let short = SignupRequest {
            email: "ada@example.com".into(),
            username: "ada".into(),
            password: "short".into(),
        };
        assert!(short.validate().is_err());

        let good = SignupRequest {
            email: "ada@example.com".into(),
            username: "ada".into(),
            password: "longenough".into(),
        };
        assert!(good.validate().is_ok());
    }
}
