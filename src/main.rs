mod auction;
mod auth;
mod board;
mod config;
mod persistence;
mod render;
mod service;
mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use store::BidStore;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::load()?;

    let persistence = persistence::SqlitePersistence::open(&config.db_path, config.pool_size)?;
    let bid_store = store::SqliteBidStore::new(persistence.clone());
    bid_store
        .initialize()
        .context("Failed to create the bids table")?;
    info!(path = %persistence.path().display(), "database ready");

    let board = Arc::new(board::BidBoard::new(
        Arc::new(bid_store),
        auth::StaticPassword::new_shared(config.admin_password.clone()),
    ));
    let ui_state = service::UiState::new(board, persistence.path().display().to_string());

    let svc_ctr = service::ServiceControl::new();

    ctrlc::set_handler({
        let svc_ctr = svc_ctr.clone();
        move || {
            eprintln!("Stopping all services...");
            svc_ctr.stop_all();
        }
    })?;

    svc_ctr
        .spawn_loop(service::Ui::new(ui_state, config.bind)?)
        .join()
}
