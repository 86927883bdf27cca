//! Spendbot - receipt-tracking Telegram bot
//!
//! Architecture:
//! - SeaORM for data access (embedded SQLite or remote PostgreSQL)
//! - Teloxide for the Telegram surface
//! - JWT activation tokens gating premium analytics
//! - Tokio for the async runtime

mod bot;
mod config;
mod db;
mod entities;
mod error;
mod extract;
mod prelude;
mod services;
mod state;
mod token;
mod utils;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::prelude::*;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "spendbot=debug,teloxide=info,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting Spendbot v{}", env!("CARGO_PKG_VERSION"));
  info!(backend = config.db.backend_name(), "selected storage backend");

  // connecting also brings the schema up; failure here is fatal
  let app = Arc::new(AppState::new(&config).await?);

  bot::run_bot(app).await;
  Ok(())
}
