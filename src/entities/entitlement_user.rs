//! Entitlement user entity - premium/free status keyed by platform-native id

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account status enum
#[derive(
  Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum AccountStatus {
  #[sea_orm(string_value = "Free")]
  Free,
  #[sea_orm(string_value = "Premium")]
  Premium,
}

impl Default for AccountStatus {
  fn default() -> Self {
    Self::Free
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entitlement_users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub tg_user_id: i64,
  pub status: AccountStatus,
  pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "super::entitlement_record::Entity")]
  Record,
}

impl Related<super::entitlement_record::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Record.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
