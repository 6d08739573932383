use std::net::SocketAddr;
use std::sync::Arc;

use crate::model::{DbConnection, ModelManager};
use crate::payment::{PaymentGateway, SslCommerzGateway};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod model;
pub mod payment;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "edtech";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate().await?;

    let uploads = utils::uploads::ensure_uploads_dir(config.app().upload_dir())?;
    tracing::debug!("serving uploads from {}", uploads.display());

    if config.payment().store_id().is_empty() {
        tracing::warn!("payment gateway credentials are missing, paid enrollment is disabled");
    }
    let gateway = Arc::new(SslCommerzGateway::from_config(config.payment()));

    build_server_with(db, gateway).await
}

pub async fn build_server_with(
    db: DbConnection,
    gateway: Arc<dyn PaymentGateway>,
) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(cfg!(debug_assertions)).await;

    let mm = ModelManager::new(db);
    let state = AppState::new(mm, gateway, config);
    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let bindto = state.config().host().bindto();
    let listener = TcpListener::bind(bindto).await?;

    tracing::info!("{} is starting at: {}", APPLICATION_NAME, bindto);
    let axum_handle = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
