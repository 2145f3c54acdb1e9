use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::env::ensure_upload_dir;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use service::{images::DiskImageStore, repo::seaorm::SeaOrmRepository};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::{set_expose_error_details, StartupError};
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
    }
}

/// Public entry: load config, migrate the database, build the app and serve
/// until Ctrl+C. The caller installs the tracing subscriber beforehand.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    set_expose_error_details(cfg.server.expose_error_details);

    ensure_upload_dir(&cfg.server.upload_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await?;
    info!(event = "migrations_applied", "database schema up to date");

    let repo = Arc::new(SeaOrmRepository::new(db));
    let images = Arc::new(DiskImageStore::new(&cfg.server.upload_dir));
    let state = ServerState::new(repo, images, &cfg);

    let app: Router = routes::build_router(state, build_cors(), &cfg.server.upload_dir);

    let addr = bind_addr(&cfg)?;
    info!(%addr, strict_transitions = cfg.orders.strict_transitions, "starting marketplace api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
