use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use istore_api::{app, metrics::Metrics, AppState, AuthConfig};
use istore_core::{LogDelivery, Repositories, SessionStore};
use istore_store::app_config::{Config, StorageBackend};
use istore_store::{postgres_repositories, DbClient, MemorySessionStore, MemoryStore, RedisSessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "istore_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting iStore API on port {}", config.server.port);

    let (repos, sessions): (Repositories, Arc<dyn SessionStore>) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let sessions = RedisSessionStore::new(&config.redis.url)
                .context("Invalid Redis URL")?;
            (postgres_repositories(db.pool), Arc::new(sessions) as Arc<dyn SessionStore>)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (
                MemoryStore::new().repositories(),
                Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>,
            )
        }
    };

    let app_state = AppState {
        repos,
        sessions,
        delivery: Arc::new(LogDelivery),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            magic_link_ttl: config.auth.magic_link_ttl_seconds,
            magic_link_rate_limit: config.auth.magic_link_rate_limit,
            public_url: config.server.public_url.clone(),
        },
        metrics: Arc::new(Metrics::new().context("Failed to register metrics")?),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
