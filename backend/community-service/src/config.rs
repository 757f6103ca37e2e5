/// Configuration management for community-service
///
/// Loads configuration from environment variables (optionally seeded from `.env`).
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    pub payment: PaymentConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
    /// Where the OAuth callback sends the browser after login
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

/// Redis is optional. When set, live notifications fan out across instances
/// through pub/sub instead of staying in the local socket registry.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub token_ttl_secs: i64,
    pub cookie_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub google: Option<GoogleOAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub api_base: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, "*" allows any
    pub allowed_origins: String,
    pub max_age: usize,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_token_ttl_secs() -> i64 {
    86400 // 1 day
}

fn default_cookie_name() -> String {
    "token".to_string()
}

fn default_payment_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_cors_max_age() -> usize {
    3600
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| default_app_env()),
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: parse_or("APP_PORT", default_app_port()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| default_frontend_url()),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", default_db_max_connections()),
            run_migrations: parse_or("RUN_MIGRATIONS", true),
        };

        let redis = RedisConfig {
            url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
        };

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").context("JWT_SECRET environment variable not set")?,
            token_ttl_secs: parse_or("JWT_TOKEN_TTL_SECS", default_token_ttl_secs()),
            cookie_name: env::var("JWT_COOKIE_NAME").unwrap_or_else(|_| default_cookie_name()),
        };

        // Google login is only wired up when all three values are present
        let google = match (
            env::var("GOOGLE_CLIENT_ID"),
            env::var("GOOGLE_CLIENT_SECRET"),
            env::var("GOOGLE_REDIRECT_URI"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(redirect_uri)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        };

        let payment = PaymentConfig {
            api_base: env::var("STRIPE_API_BASE").unwrap_or_else(|_| default_payment_api_base()),
            secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| default_currency()),
        };

        let cors = CorsConfig {
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| default_frontend_url()),
            max_age: parse_or("CORS_MAX_AGE", default_cors_max_age()),
        };

        Ok(Config {
            app,
            database,
            redis,
            jwt,
            oauth: OAuthConfig { google },
            payment,
            cors,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}
