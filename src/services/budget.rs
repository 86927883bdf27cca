//! Budget ledger - one monthly ceiling per user, usage computed on demand

use sea_orm::sea_query::OnConflict;

use crate::{entities::budget_limit, prelude::*, services::Invoices};

pub struct Budget<'a> {
  db: &'a DatabaseConnection,
}

/// Spend-to-limit classification used to pick alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTier {
  NoLimit,
  Safe,
  Approaching,
  Warning,
  Exceeded,
}

impl UsageTier {
  /// Exact cutoffs: below 75% is safe, 75-89% approaching, 90-99% warning,
  /// 100% and above exceeded.
  pub fn classify(percent_used: f64) -> Self {
    if percent_used < 75.0 {
      Self::Safe
    } else if percent_used < 90.0 {
      Self::Approaching
    } else if percent_used < 100.0 {
      Self::Warning
    } else {
      Self::Exceeded
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::NoLimit => "no limit set",
      Self::Safe => "on track",
      Self::Approaching => "approaching limit",
      Self::Warning => "close to limit",
      Self::Exceeded => "limit exceeded",
    }
  }
}

#[derive(Debug, Clone)]
pub struct BudgetUsage {
  pub limit: Option<f64>,
  pub current_spend: f64,
  pub remaining: Option<f64>,
  pub percent_used: Option<f64>,
  pub tier: UsageTier,
}

impl<'a> Budget<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Set or replace the user's monthly limit. Native upsert keyed on the
  /// user, so repeated calls never grow a second row.
  pub async fn set_monthly_limit(
    &self,
    user_id: i64,
    amount: f64,
  ) -> Result<()> {
    if amount < 0.0 || !amount.is_finite() {
      return Err(Error::Validation(
        "monthly limit must be a non-negative amount".into(),
      ));
    }

    let now = Utc::now().naive_utc();
    let row = budget_limit::ActiveModel {
      user_id: Set(user_id),
      monthly_limit: Set(amount),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    };

    budget_limit::Entity::insert(row)
      .on_conflict(
        OnConflict::column(budget_limit::Column::UserId)
          .update_columns([
            budget_limit::Column::MonthlyLimit,
            budget_limit::Column::UpdatedAt,
          ])
          .to_owned(),
      )
      .exec(self.db)
      .await
      .map_err(Error::db("set_monthly_limit"))?;

    info!(user = user_id, amount, "monthly limit set");
    Ok(())
  }

  /// Usage for the calendar month containing now. Spend is recomputed from
  /// the invoices on every call rather than kept as a running counter, so
  /// corrections to invoices are always reflected.
  pub async fn current_usage(&self, user_id: i64) -> Result<BudgetUsage> {
    let limit = budget_limit::Entity::find()
      .filter(budget_limit::Column::UserId.eq(user_id))
      .one(self.db)
      .await
      .map_err(Error::db("get_budget_limit"))?;

    let (start, end) = utils::month_bounds(Utc::now().date_naive());
    let spent = Invoices::new(self.db)
      .aggregate_spend(Some(user_id), start, Some(end))
      .await?;

    let Some(limit) = limit else {
      return Ok(BudgetUsage {
        limit: None,
        current_spend: spent.total,
        remaining: None,
        percent_used: None,
        tier: UsageTier::NoLimit,
      });
    };

    let monthly = limit.monthly_limit;
    // a zero limit has no headroom and always reads as fully used
    let percent_used =
      if monthly > 0.0 { spent.total / monthly * 100.0 } else { 100.0 };

    Ok(BudgetUsage {
      limit: Some(monthly),
      current_spend: spent.total,
      remaining: Some(monthly - spent.total),
      percent_used: Some(percent_used),
      tier: UsageTier::classify(percent_used),
    })
  }
}

#[cfg(test)]
mod tests {
  use sea_orm::{DbBackend, Schema};

  use super::*;
  use crate::{
    entities::{invoice, invoice_item, platform_user},
    extract::{ExtractedInvoice, ExtractedItem},
  };

  async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(platform_user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(budget_limit::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(invoice::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(invoice_item::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    seed_users(&db, &[1, 2]).await;

    db
  }

  async fn seed_users(db: &DatabaseConnection, ids: &[i64]) {
    let now = Utc::now().naive_utc();
    for &id in ids {
      platform_user::Entity::insert(platform_user::ActiveModel {
        id: Set(id),
        platform: Set("test".into()),
        platform_user_id: Set(id.to_string()),
        display_name: Set(None),
        created_at: Set(now),
        last_active_at: Set(now),
      })
      .exec(db)
      .await
      .unwrap();
    }
  }

  async fn spend(db: &DatabaseConnection, user: i64, amount: f64) {
    let extracted = ExtractedInvoice {
      shop_name: "shop".into(),
      invoice_date: Utc::now().date_naive(),
      total_amount: amount,
      transaction_category: None,
      items: vec![ExtractedItem {
        name: "item".into(),
        quantity: 1,
        unit_price: None,
        total_price: amount,
      }],
    };
    Invoices::new(db).insert(Some(user), &extracted, None).await.unwrap();
  }

  #[test]
  fn tier_cutoffs_are_exact() {
    assert_eq!(UsageTier::classify(0.0), UsageTier::Safe);
    assert_eq!(UsageTier::classify(74.9999), UsageTier::Safe);
    assert_eq!(UsageTier::classify(75.0), UsageTier::Approaching);
    assert_eq!(UsageTier::classify(89.9999), UsageTier::Approaching);
    assert_eq!(UsageTier::classify(90.0), UsageTier::Warning);
    assert_eq!(UsageTier::classify(99.9999), UsageTier::Warning);
    assert_eq!(UsageTier::classify(100.0), UsageTier::Exceeded);
    assert_eq!(UsageTier::classify(250.0), UsageTier::Exceeded);
  }

  #[tokio::test]
  async fn no_limit_row_reports_no_limit_tier() {
    let db = setup_test_db().await;
    let usage = Budget::new(&db).current_usage(1).await.unwrap();

    assert_eq!(usage.tier, UsageTier::NoLimit);
    assert!(usage.limit.is_none());
    assert!(usage.percent_used.is_none());
  }

  #[tokio::test]
  async fn repeated_set_limit_keeps_a_single_row() {
    let db = setup_test_db().await;
    let sv = Budget::new(&db);

    sv.set_monthly_limit(1, 500_000.0).await.unwrap();
    sv.set_monthly_limit(1, 1_000_000.0).await.unwrap();

    assert_eq!(budget_limit::Entity::find().count(&db).await.unwrap(), 1);
    let usage = sv.current_usage(1).await.unwrap();
    assert_eq!(usage.limit, Some(1_000_000.0));
  }

  #[tokio::test]
  async fn negative_limit_is_rejected() {
    let db = setup_test_db().await;
    assert!(matches!(
      Budget::new(&db).set_monthly_limit(1, -5.0).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn this_month_spending_classifies_against_the_limit() {
    let db = setup_test_db().await;
    let sv = Budget::new(&db);

    sv.set_monthly_limit(1, 1_000_000.0).await.unwrap();
    spend(&db, 1, 600_000.0).await;
    spend(&db, 1, 350_000.0).await;
    // another user's spending must not count
    spend(&db, 2, 900_000.0).await;

    let usage = sv.current_usage(1).await.unwrap();
    assert!((usage.current_spend - 950_000.0).abs() < f64::EPSILON);
    assert!((usage.percent_used.unwrap() - 95.0).abs() < 1e-9);
    assert_eq!(usage.tier, UsageTier::Warning);
    assert!((usage.remaining.unwrap() - 50_000.0).abs() < f64::EPSILON);
  }

  #[tokio::test]
  async fn zero_limit_reads_as_fully_used() {
    let db = setup_test_db().await;
    let sv = Budget::new(&db);

    sv.set_monthly_limit(1, 0.0).await.unwrap();
    let usage = sv.current_usage(1).await.unwrap();

    assert_eq!(usage.tier, UsageTier::Exceeded);
    assert_eq!(usage.percent_used, Some(100.0));
  }
}
