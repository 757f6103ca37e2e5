use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use community_service::{
    config::{Config, CorsConfig},
    db::{create_pool, run_migrations},
    metrics::MetricsMiddleware,
    repository::Repositories,
    routes,
    services::StripeGateway,
    websocket::{fanout::spawn_listener, LivePush, RedisFanout, SocketRegistry},
    AppState, Transports,
};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default();
    for origin in config.allowed_origins.split(',') {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(config.max_age)
}

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let config = Config::from_env().map_err(|e| io_error("failed to load configuration", e))?;

    tracing::info!("Starting community-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = create_pool(&config.database)
        .await
        .map_err(|e| io_error("failed to create database pool", e))?;
    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        run_migrations(&db_pool)
            .await
            .map_err(|e| io_error("failed to run migrations", e))?;
        tracing::info!("Database migrations completed");
    } else {
        tracing::info!("Skipping database migrations (RUN_MIGRATIONS=false)");
    }

    let notification_sockets = SocketRegistry::new();
    let chat_sockets = SocketRegistry::new();

    let live: Arc<dyn LivePush> = match config.redis.url.as_deref() {
        Some(url) => {
            let client =
                redis::Client::open(url).map_err(|e| io_error("invalid REDIS_URL", e))?;
            let fanout = RedisFanout::connect(&client)
                .await
                .map_err(|e| io_error("failed to connect to Redis", e))?;
            spawn_listener(client, notification_sockets.clone());
            tracing::info!("Live notifications fan out through Redis");
            Arc::new(fanout)
        }
        None => {
            tracing::info!("REDIS_URL not set, live notifications stay on this instance");
            Arc::new(notification_sockets.clone())
        }
    };

    if config.oauth.google.is_none() {
        tracing::warn!("Google OAuth not configured, /auth/google is disabled");
    }
    if config.payment.secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set, payment intents will fail");
    }

    let transports = Transports {
        live,
        notification_sockets,
        chat_sockets,
        payments: Arc::new(StripeGateway::new(&config.payment)),
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let cors_config = config.cors.clone();
    let repos = Repositories::postgres(&db_pool);
    let state = web::Data::new(AppState::new(config, db_pool, repos, transports));

    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(build_cors(&cors_config))
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(MetricsMiddleware)
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
