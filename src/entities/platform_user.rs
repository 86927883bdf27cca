//! Platform user entity - one row per chat-platform identity

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "platform_users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub platform: String,
  /// Platform-native identifier, e.g. the Telegram user id as text.
  /// Unique together with `platform`.
  pub platform_user_id: String,
  pub display_name: Option<String>,
  pub created_at: NaiveDateTime,
  pub last_active_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::invoice::Entity")]
  Invoices,
  #[sea_orm(has_one = "super::budget_limit::Entity")]
  BudgetLimit,
}

impl Related<super::invoice::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Invoices.def()
  }
}

impl Related<super::budget_limit::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::BudgetLimit.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
