//! Premium entitlement state machine
//!
//! Free -> Premium on activation, Premium -> Free lazily once the grant
//! expiry has passed. Expiry is enforced on read only; there is no
//! background sweep, so stored status is as fresh as the last access.

use sea_orm::{
  SqlErr,
  sea_query::{Expr, OnConflict},
};

use crate::{
  entities::{
    activation_token, entitlement_record, entitlement_user,
    entitlement_record::GrantMethod, entitlement_user::AccountStatus,
  },
  prelude::*,
  token,
};

pub struct Entitlements<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct AccessStatus {
  pub status: AccountStatus,
  /// Expiry of the current grant, or of the grant that just lapsed when a
  /// downgrade happened on this read.
  pub expires_at: Option<DateTime>,
  pub method: Option<GrantMethod>,
}

impl AccessStatus {
  pub fn is_premium(&self) -> bool {
    self.status == AccountStatus::Premium
  }

  pub fn remaining(&self) -> Option<TimeDelta> {
    if !self.is_premium() {
      return None;
    }
    self.expires_at.map(|expiry| expiry - Utc::now().naive_utc())
  }
}

#[derive(Debug, Clone, Copy)]
pub struct ClaimGrant {
  pub expires_at: DateTime,
  pub grant_days: i64,
}

/// Outcome of the premium gate. Being on the free plan is an expected
/// answer, not an error.
#[derive(Debug, Clone)]
pub enum Gate {
  Granted,
  Denied(String),
}

impl<'a> Entitlements<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn get_or_create<C: ConnectionTrait>(
    &self,
    conn: &C,
    tg_user_id: i64,
  ) -> Result<entitlement_user::Model> {
    if let Some(user) = entitlement_user::Entity::find_by_id(tg_user_id)
      .one(conn)
      .await
      .map_err(Error::db("get_entitlement_user"))?
    {
      return Ok(user);
    }

    let user = entitlement_user::ActiveModel {
      tg_user_id: Set(tg_user_id),
      status: Set(AccountStatus::Free),
      created_at: Set(Utc::now().naive_utc()),
    };

    match user.insert(conn).await {
      Ok(user) => Ok(user),
      // two first-contact requests can race on the same id; the loser
      // simply reads the winner's row
      Err(err)
        if matches!(
          err.sql_err(),
          Some(SqlErr::UniqueConstraintViolation(_))
        ) =>
      {
        entitlement_user::Entity::find_by_id(tg_user_id)
          .one(conn)
          .await
          .map_err(Error::db("get_entitlement_user"))?
          .ok_or_else(|| {
            Error::db("get_entitlement_user")(sea_orm::DbErr::Custom(
              "user row missing after concurrent insert".into(),
            ))
          })
      }
      Err(err) => Err(Error::db("create_entitlement_user")(err)),
    }
  }

  /// Current status, creating the user in Free status on first contact.
  /// A premium marker whose grant is missing or past expiry is corrected
  /// to Free as a side effect of this read.
  pub async fn check_access(&self, tg_user_id: i64) -> Result<AccessStatus> {
    let user = self.get_or_create(self.db, tg_user_id).await?;
    if user.status != AccountStatus::Premium {
      return Ok(AccessStatus {
        status: AccountStatus::Free,
        expires_at: None,
        method: None,
      });
    }

    let record = entitlement_record::Entity::find()
      .filter(entitlement_record::Column::TgUserId.eq(tg_user_id))
      .one(self.db)
      .await
      .map_err(Error::db("get_entitlement_record"))?;

    let now = Utc::now().naive_utc();
    match record {
      Some(record) if now <= record.expires_at => Ok(AccessStatus {
        status: AccountStatus::Premium,
        expires_at: Some(record.expires_at),
        method: Some(record.method),
      }),
      lapsed => {
        debug!(user = tg_user_id, "premium lapsed, downgrading on read");
        let mut active: entitlement_user::ActiveModel = user.into();
        active.status = Set(AccountStatus::Free);
        active
          .update(self.db)
          .await
          .map_err(Error::db("downgrade_entitlement"))?;

        Ok(AccessStatus {
          status: AccountStatus::Free,
          expires_at: lapsed.map(|record| record.expires_at),
          method: None,
        })
      }
    }
  }

  /// Grant or renew premium for `days` from now. Overwrites the single
  /// entitlement record; never touches activation tokens.
  pub async fn activate(
    &self,
    tg_user_id: i64,
    method: GrantMethod,
    days: i64,
  ) -> Result<DateTime> {
    let txn =
      self.db.begin().await.map_err(Error::db("activate_premium"))?;
    let expires_at =
      self.activate_in(&txn, tg_user_id, method, days).await?;
    txn.commit().await.map_err(Error::db("activate_premium"))?;

    info!(user = tg_user_id, days, "premium activated");
    Ok(expires_at)
  }

  async fn activate_in<C: ConnectionTrait>(
    &self,
    conn: &C,
    tg_user_id: i64,
    method: GrantMethod,
    days: i64,
  ) -> Result<DateTime> {
    let user = self.get_or_create(conn, tg_user_id).await?;

    let now = Utc::now().naive_utc();
    let expires_at = now + TimeDelta::days(days);

    let record = entitlement_record::ActiveModel {
      tg_user_id: Set(tg_user_id),
      method: Set(method),
      expires_at: Set(expires_at),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    };

    entitlement_record::Entity::insert(record)
      .on_conflict(
        OnConflict::column(entitlement_record::Column::TgUserId)
          .update_columns([
            entitlement_record::Column::Method,
            entitlement_record::Column::ExpiresAt,
            entitlement_record::Column::UpdatedAt,
          ])
          .to_owned(),
      )
      .exec(conn)
      .await
      .map_err(Error::db("activate_premium"))?;

    let mut active: entitlement_user::ActiveModel = user.into();
    active.status = Set(AccountStatus::Premium);
    active.update(conn).await.map_err(Error::db("activate_premium"))?;

    Ok(expires_at)
  }

  /// Redeem a signed activation token. Signature, purpose and embedded
  /// expiry are checked first; consumption is a conditional update on the
  /// used flag so a raced token is claimed by exactly one caller.
  pub async fn claim_token(
    &self,
    tg_user_id: i64,
    raw: &str,
    secret: &str,
  ) -> Result<ClaimGrant> {
    let claims = token::verify(raw, secret)?;
    let grant_days = claims.grant_days();

    let txn = self.db.begin().await.map_err(Error::db("claim_token"))?;

    let flipped = activation_token::Entity::update_many()
      .col_expr(activation_token::Column::IsUsed, Expr::value(true))
      .filter(activation_token::Column::Token.eq(raw))
      .filter(activation_token::Column::IsUsed.eq(false))
      .exec(&txn)
      .await
      .map_err(Error::db("claim_token"))?;

    if flipped.rows_affected == 0 {
      let known = activation_token::Entity::find_by_id(raw)
        .one(&txn)
        .await
        .map_err(Error::db("claim_token"))?;

      match known {
        Some(_) => return Err(Error::TokenAlreadyUsed),
        None => {
          // a validly signed token we have not seen before: record it as
          // consumed; losing the insert race means someone else claimed it
          let row = activation_token::ActiveModel {
            token: Set(raw.to_string()),
            is_used: Set(true),
          };
          if let Err(err) = row.insert(&txn).await {
            return match err.sql_err() {
              Some(SqlErr::UniqueConstraintViolation(_)) => {
                Err(Error::TokenAlreadyUsed)
              }
              _ => Err(Error::db("claim_token")(err)),
            };
          }
        }
      }
    }

    let expires_at = self
      .activate_in(&txn, tg_user_id, GrantMethod::ClaimedToken, grant_days)
      .await?;
    txn.commit().await.map_err(Error::db("claim_token"))?;

    info!(user = tg_user_id, days = grant_days, "activation token claimed");
    Ok(ClaimGrant { expires_at, grant_days })
  }

  /// Premium gate for the analytics surface. The denial text is the one
  /// presentation string the core owns.
  pub async fn require_premium(&self, tg_user_id: i64) -> Result<Gate> {
    let access = self.check_access(tg_user_id).await?;
    if access.is_premium() {
      Ok(Gate::Granted)
    } else {
      Ok(Gate::Denied(
        "🔒 This is a premium feature.\n\n\
         💎 Premium unlocks advanced analytics and detailed reports.\n\
         Redeem an activation token with /claim <token> to upgrade."
          .into(),
      ))
    }
  }
}

#[cfg(test)]
mod tests {
  use sea_orm::{ConnectOptions, DbBackend, Schema};

  use super::*;
  use crate::entities::{
    activation_token, entitlement_record, entitlement_user,
  };

  const SECRET: &str = "entitlement-test-secret";

  async fn setup_test_db() -> DatabaseConnection {
    // one pooled connection so concurrent claims serialize on the same
    // in-memory database instead of getting separate ones
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();

    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(entitlement_user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(entitlement_record::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(activation_token::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  #[tokio::test]
  async fn first_contact_creates_a_free_user() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    let access = sv.check_access(42).await.unwrap();
    assert_eq!(access.status, AccountStatus::Free);
    assert!(access.expires_at.is_none());

    assert_eq!(
      entitlement_user::Entity::find().count(&db).await.unwrap(),
      1
    );
  }

  #[tokio::test]
  async fn activation_grants_premium_until_expiry() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    let before = Utc::now().naive_utc();
    let expiry = sv.activate(42, GrantMethod::Payment, 30).await.unwrap();

    let granted = expiry - before;
    assert!(granted >= TimeDelta::days(30));
    assert!(granted < TimeDelta::days(30) + TimeDelta::seconds(5));

    let access = sv.check_access(42).await.unwrap();
    assert!(access.is_premium());
    assert_eq!(access.method, Some(GrantMethod::Payment));
  }

  #[tokio::test]
  async fn renewal_overwrites_the_single_record() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    sv.activate(42, GrantMethod::Payment, 5).await.unwrap();
    sv.activate(42, GrantMethod::Payment, 60).await.unwrap();

    assert_eq!(
      entitlement_record::Entity::find().count(&db).await.unwrap(),
      1
    );
    let access = sv.check_access(42).await.unwrap();
    assert!(access.remaining().unwrap() > TimeDelta::days(59));
  }

  #[tokio::test]
  async fn expired_grant_downgrades_lazily_on_read() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    sv.activate(42, GrantMethod::Payment, 0).await.unwrap();

    let access = sv.check_access(42).await.unwrap();
    assert_eq!(access.status, AccountStatus::Free);
    // the lapsed expiry is still reported on the downgrading read
    assert!(access.expires_at.is_some());

    // a second read of the already-downgraded user is an ordinary miss
    let again = sv.check_access(42).await.unwrap();
    assert_eq!(again.status, AccountStatus::Free);
    assert!(again.expires_at.is_none());
  }

  #[tokio::test]
  async fn token_lifecycle_single_use() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    let raw = crate::token::issue(SECRET, 7, "30 days").unwrap();

    let before = Utc::now().naive_utc();
    let grant = sv.claim_token(42, &raw, SECRET).await.unwrap();
    assert_eq!(grant.grant_days, 30);
    let granted = grant.expires_at - before;
    assert!(granted >= TimeDelta::days(30));
    assert!(granted < TimeDelta::days(30) + TimeDelta::seconds(5));

    let expiry_after_first = sv.check_access(42).await.unwrap().expires_at;

    assert!(matches!(
      sv.claim_token(42, &raw, SECRET).await,
      Err(Error::TokenAlreadyUsed)
    ));

    // the failed second claim must not have moved the expiry
    let expiry_after_second = sv.check_access(42).await.unwrap().expires_at;
    assert_eq!(expiry_after_first, expiry_after_second);
  }

  #[tokio::test]
  async fn concurrent_claims_have_exactly_one_winner() {
    let db = setup_test_db().await;
    let raw = crate::token::issue(SECRET, 7, "30 days").unwrap();

    let sv_first = Entitlements::new(&db);
    let sv_second = Entitlements::new(&db);
    let first = sv_first.claim_token(7, &raw, SECRET);
    let second = sv_second.claim_token(8, &raw, SECRET);
    let (first, second) = tokio::join!(first, second);

    let successes =
      [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(Error::TokenAlreadyUsed)));
  }

  #[tokio::test]
  async fn expired_token_is_rejected_before_any_state_change() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    let raw = crate::token::issue(SECRET, -1, "30 days").unwrap();
    assert!(matches!(
      sv.claim_token(42, &raw, SECRET).await,
      Err(Error::TokenExpired)
    ));

    assert_eq!(
      activation_token::Entity::find().count(&db).await.unwrap(),
      0
    );
    let access = sv.check_access(42).await.unwrap();
    assert!(!access.is_premium());
  }

  #[tokio::test]
  async fn tampered_token_is_invalid() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    let raw = crate::token::issue("someone-elses-secret", 7, "30 days").unwrap();
    assert!(matches!(
      sv.claim_token(42, &raw, SECRET).await,
      Err(Error::InvalidToken(_))
    ));
  }

  #[tokio::test]
  async fn gate_denies_free_users_with_an_explanation() {
    let db = setup_test_db().await;
    let sv = Entitlements::new(&db);

    match sv.require_premium(42).await.unwrap() {
      Gate::Denied(message) => assert!(message.contains("/claim")),
      Gate::Granted => panic!("free user passed the premium gate"),
    }

    sv.activate(42, GrantMethod::Payment, 30).await.unwrap();
    assert!(matches!(
      sv.require_premium(42).await.unwrap(),
      Gate::Granted
    ));
  }
}
