/// Connection pool, migrations and the plain query modules used by the
/// auxiliary services (accounts, comments, likes, messages).
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;

pub mod comment_repo;
pub mod like_repo;
pub mod message_repo;
pub mod users;

pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}
