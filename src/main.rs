//! Local Library server entry point

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locallibrary_server::{
    api,
    config::{AppConfig, SessionBackend},
    services::{
        redis::RedisSessionStore,
        sessions::{MemorySessionStore, SessionStore},
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("locallibrary_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Local Library server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let session_store: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Redis => {
            let store =
                RedisSessionStore::new(&config.session.redis_url, config.session.ttl_seconds)
                    .await
                    .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis session store");
            Arc::new(store)
        }
    };

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState::new(config, pool, session_store);

    state
        .services
        .users
        .ensure_admin()
        .await
        .context("Failed to create bootstrap superuser")?;

    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
