use std::collections::HashSet;

use teloxide::Bot;

use crate::{
  config::Config, db, extract::HttpExtractor, prelude::*, services,
};

pub struct Services<'a> {
  pub users: services::Users<'a>,
  pub invoices: services::Invoices<'a>,
  pub budget: services::Budget<'a>,
  pub entitlements: services::Entitlements<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub bot: Bot,
  pub admins: HashSet<i64>,
  pub token_secret: String,
  pub extractor: Option<HttpExtractor>,
}

impl AppState {
  pub async fn new(config: &Config) -> Result<Self> {
    let db = db::connect(&config.db).await?;

    Ok(Self {
      db,
      bot: Bot::new(&config.telegram_token),
      admins: config.admins.clone(),
      token_secret: config.token_secret.clone(),
      extractor: config.extractor_url.as_deref().map(HttpExtractor::new),
    })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      users: services::Users::new(&self.db),
      invoices: services::Invoices::new(&self.db),
      budget: services::Budget::new(&self.db),
      entitlements: services::Entitlements::new(&self.db),
    }
  }
}
