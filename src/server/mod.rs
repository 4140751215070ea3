pub mod app;
pub mod auth;
#[cfg(feature = "docs")]
pub mod docs;
pub mod handlers;

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use tracing::{info, warn};

use crate::chat::relay_from_config;
use crate::config::Config;
use crate::database::{connection::*, migrations::Migrator};
use crate::services::AuthService;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn start_server(config: Config) -> Result<()> {
    let database_url = get_database_url(Some(&config.database));
    let db = establish_connection(&database_url).await?;

    setup_database(&db).await?;
    info!("Database migrations completed");

    if config.chat.api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set; chat requests will fail until it is configured");
    }
    let relay = relay_from_config(&config.chat)?;

    spawn_session_purge(AuthService::new(db.clone()));

    let port = config.port;
    let app = app::create_app(db, config, relay).await?;

    log_routes(port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn spawn_session_purge(auth: AuthService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match auth.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired sessions", removed),
                Err(err) => warn!("Failed to purge expired sessions: {}", err),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn log_routes(port: u16) {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    #[cfg(feature = "docs")]
    info!("  /docs                       - Swagger UI documentation");
    info!("  /api/auth/*, /api/profile   - Sessions and profiles");
    info!("  /api/courses, /api/lessons  - Catalog, authoring and lesson player");
    info!("  /api/notes, /api/files      - Notes and uploads");
    info!("  /api/conversations          - Stored chat conversations");
    info!("  /api/chat                   - Stateless chat relay (open CORS)");
    info!("  /storage/*                  - Uploaded files");
    info!("Base URL: http://localhost:{}", port);
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let db = connect(database_path).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Dropping all tables and re-running migrations");
            Migrator::fresh(&db).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

pub async fn connect(database_path: &str) -> Result<DatabaseConnection> {
    let database_url = get_database_url(Some(database_path));
    Ok(establish_connection(&database_url).await?)
}
