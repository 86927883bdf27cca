//! Connection router
//!
//! Builds the pooled connection for whichever backend the configuration
//! selects and brings the schema up before handing the pool out, so a
//! successfully acquired connection always sees the full table set.

use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;

use crate::{config::DbConfig, prelude::*};

pub async fn connect(config: &DbConfig) -> Result<DatabaseConnection> {
  info!(backend = config.backend_name(), "connecting to database");

  let mut options = ConnectOptions::new(config.database_url());
  match config {
    DbConfig::Remote { .. } => {
      options
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(3600));
    }
    DbConfig::Local { .. } => {
      // SQLite has a single writer; extra connections only produce
      // busy errors under concurrent updates
      options.max_connections(1);
    }
  }
  options.sqlx_logging(false);

  let db = Database::connect(options)
    .await
    .map_err(Error::db("connect"))?;

  info!("ensuring schema");
  Migrator::up(&db, None).await.map_err(Error::Schema)?;

  Ok(db)
}
