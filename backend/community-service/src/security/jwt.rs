//! HS256 session tokens
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret, config.token_ttl_secs)
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_issue_and_verify() {
        let keys = JwtKeys::new("test-secret", 3600);
        let user = Uuid::new_v4();
        let token = keys.issue(user, "ada@example.com").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.id, user);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtKeys::new("one", 3600)
            .issue(Uuid::new_v4(), "a@b.c")
            .unwrap();
        assert!(matches!(
            JwtKeys::new("two", 3600).verify(&token),
            Err(AppError::Token(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new("secret", -3600);
        let token = keys.issue(Uuid::new_v4(), "a@b.c").unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
