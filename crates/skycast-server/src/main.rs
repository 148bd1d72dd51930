//! Skycast server binary: config, database, migrations, sessions, serve.

use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database};
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};

use skycast_core::Config;
use skycast_server::routes;
use skycast_server::state::AppState;
use skycast_store::migration::MigratorTrait;
use skycast_store::{DbSessionStore, Migrator};

const CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    skycast_core::init()?;

    let (config, _validation) = Config::load()?;

    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .min_connections(
            config
                .database
                .min_connections
                .min(config.database.max_connections),
        )
        .connect_timeout(Duration::from_secs(config.database.connect_timeout_secs));
    let db = Database::connect(options)
        .await
        .context("Failed to connect to the database")?;

    tracing::info!("running migrations");
    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    let session_store = DbSessionStore::new(db.clone());
    let cleanup_store = session_store.clone();
    let cleanup_db = db.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = cleanup_store.delete_expired().await {
                tracing::warn!("session cleanup failed: {e}");
            }
            if let Err(e) = skycast_store::cache::purge_expired(&cleanup_db).await {
                tracing::warn!("cache cleanup failed: {e}");
            }
            tokio::time::sleep(Duration::from_secs(CLEANUP_INTERVAL_SECS)).await;
        }
    });

    let session_layer = SessionManagerLayer::new(session_store).with_expiry(
        Expiry::OnInactivity(time::Duration::days(config.auth.session_days)),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(db, config)?;
    let app = routes::router(state).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
