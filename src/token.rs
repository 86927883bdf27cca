//! Activation token verification
//!
//! Tokens are HS256-signed strings issued by the payment/admin side. The
//! bot never generates user-facing tokens at runtime; `issue` exists for
//! the admin command and tests.

use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
  errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Purpose tag a premium activation token must carry.
pub const PREMIUM_PURPOSE: &str = "premium_claim";

const DEFAULT_GRANT_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
  pub exp: i64,
  pub iat: i64,
  /// Premium duration granted on claim, e.g. "30 days".
  pub duration: String,
  pub purpose: String,
}

impl TokenClaims {
  /// Days of premium this token grants. Accepts "N days", "N weeks" and
  /// "N months"; anything unparseable falls back to 7 days.
  pub fn grant_days(&self) -> i64 {
    let mut parts = self.duration.split_whitespace();
    let (Some(number), Some(unit)) = (parts.next(), parts.next()) else {
      return DEFAULT_GRANT_DAYS;
    };
    let Ok(number) = number.parse::<i64>() else {
      return DEFAULT_GRANT_DAYS;
    };
    if number <= 0 {
      return DEFAULT_GRANT_DAYS;
    }

    let unit = unit.to_ascii_lowercase();
    if unit.starts_with("day") {
      number
    } else if unit.starts_with("week") {
      number * 7
    } else if unit.starts_with("month") {
      number * 30
    } else {
      DEFAULT_GRANT_DAYS
    }
  }
}

/// Verify signature, embedded expiry and purpose tag.
pub fn verify(raw: &str, secret: &str) -> Result<TokenClaims> {
  let mut validation = Validation::new(Algorithm::HS256);
  // an expired token must be rejected exactly at its expiry, not after a
  // grace window
  validation.leeway = 0;

  let data = decode::<TokenClaims>(
    raw,
    &DecodingKey::from_secret(secret.as_bytes()),
    &validation,
  )
  .map_err(|err| match err.kind() {
    ErrorKind::ExpiredSignature => Error::TokenExpired,
    ErrorKind::InvalidSignature => {
      Error::InvalidToken("signature verification failed".into())
    }
    _ => Error::InvalidToken(err.to_string()),
  })?;

  if data.claims.purpose != PREMIUM_PURPOSE {
    return Err(Error::InvalidToken("not a premium activation token".into()));
  }

  Ok(data.claims)
}

/// Sign a new activation token valid for `valid_days` that grants
/// `grant` worth of premium when claimed.
pub fn issue(secret: &str, valid_days: i64, grant: &str) -> Result<String> {
  let now = Utc::now();
  let claims = TokenClaims {
    exp: (now + TimeDelta::days(valid_days)).timestamp(),
    iat: now.timestamp(),
    duration: grant.to_string(),
    purpose: PREMIUM_PURPOSE.into(),
  };

  encode(
    &Header::new(Algorithm::HS256),
    &claims,
    &EncodingKey::from_secret(secret.as_bytes()),
  )
  .map_err(|err| Error::Validation(format!("failed to sign token: {err}")))
}
