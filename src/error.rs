//! Error types for the expense tracker

use sea_orm::DbErr;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
  /// Missing or inconsistent startup configuration. Fatal.
  #[error("configuration error: {0}")]
  Config(String),

  /// DDL failed while ensuring the schema. Fatal on first boot.
  #[error("schema setup failed: {0}")]
  Schema(#[source] DbErr),

  /// Backend/connection failure. The caller may retry once with a fresh
  /// pooled connection before surfacing a generic failure.
  #[error("database error in {operation}: {source}")]
  Persistence {
    operation: &'static str,
    #[source]
    source: DbErr,
  },

  #[error("invalid activation token: {0}")]
  InvalidToken(String),

  #[error("activation token expired")]
  TokenExpired,

  #[error("activation token already used")]
  TokenAlreadyUsed,

  #[error("{0}")]
  Validation(String),

  #[error("receipt extraction failed: {0}")]
  Extraction(String),
}

impl Error {
  pub(crate) fn db(operation: &'static str) -> impl Fn(DbErr) -> Self {
    move |source| Self::Persistence { operation, source }
  }

  /// Text safe to show to the end user. Token and validation problems get a
  /// specific actionable message; internal failures stay generic.
  pub fn user_message(&self) -> String {
    match self {
      Self::InvalidToken(_) => {
        "That activation token is not valid. \
         Check that you pasted the whole token."
          .into()
      }
      Self::TokenExpired => {
        "That activation token has expired and can no longer be redeemed."
          .into()
      }
      Self::TokenAlreadyUsed => {
        "This token has already been claimed. \
         Each token can only be used once."
          .into()
      }
      Self::Validation(message) => message.clone(),
      Self::Extraction(_) => {
        "Could not read that receipt. Try a sharper photo.".into()
      }
      _ => "Something went wrong on our side. Please try again.".into(),
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
