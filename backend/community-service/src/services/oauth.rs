/// Google sign-in (authorization code flow)
use reqwest::{Client, Url};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use crate::config::GoogleOAuthConfig;
use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::User;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuth {
    config: GoogleOAuthConfig,
    db: PgPool,
    http: Client,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig, db: PgPool) -> Self {
        Self {
            config,
            db,
            http: Client::new(),
        }
    }

    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(AUTHORIZE_URL)
            .map_err(|e| AppError::Internal(format!("google authorize url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .append_pair("prompt", "select_account");
        Ok(url.to_string())
    }

    /// Exchange the callback code and return the matching local user,
    /// creating or linking one as needed.
    pub async fn complete(&self, code: &str) -> Result<User> {
        let info = self.fetch_user_info(code).await?;
        let email = info
            .email
            .clone()
            .ok_or_else(|| AppError::BadRequest("Google account has no email".into()))?;

        if let Some(user) = users::find_by_google_id(&self.db, &info.sub).await? {
            return Ok(user);
        }

        if let Some(user) = users::find_by_email(&self.db, &email).await? {
            info!(user_id = %user.id, "linking Google identity to existing account");
            return Ok(users::link_google(&self.db, user.id, &info.sub).await?);
        }

        let username = username_for(&info, &email);
        let user = users::create_google(
            &self.db,
            &email,
            &username,
            &info.sub,
            info.picture.as_deref(),
        )
        .await?;
        info!(user_id = %user.id, "user signed up with Google");
        Ok(user)
    }

    async fn fetch_user_info(&self, code: &str) -> Result<GoogleUserInfo> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let token_resp = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(provider_error)?;
        if !token_resp.status().is_success() {
            error!(status = %token_resp.status(), "Google token exchange failed");
            return Err(AppError::BadRequest("Google sign-in failed".into()));
        }
        let token: TokenResponse = token_resp.json().await.map_err(provider_error)?;

        let user_resp = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(provider_error)?;
        if !user_resp.status().is_success() {
            error!(status = %user_resp.status(), "Google userinfo request failed");
            return Err(AppError::BadRequest("Google sign-in failed".into()));
        }

        user_resp.json().await.map_err(provider_error)
    }
}

fn provider_error(e: reqwest::Error) -> AppError {
    error!(error = %e, "Google OAuth request failed");
    AppError::BadRequest("Google sign-in failed".into())
}

fn username_for(info: &GoogleUserInfo, email: &str) -> String {
    info.name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}
