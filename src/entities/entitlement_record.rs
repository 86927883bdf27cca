//! Entitlement record entity - the active (or most recently expired) grant

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the grant was acquired
#[derive(
  Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum GrantMethod {
  #[sea_orm(string_value = "payment")]
  Payment,
  #[sea_orm(string_value = "claimed-token")]
  ClaimedToken,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entitlement_records")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  #[sea_orm(unique)]
  pub tg_user_id: i64,
  pub method: GrantMethod,
  pub expires_at: NaiveDateTime,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::entitlement_user::Entity",
    from = "Column::TgUserId",
    to = "super::entitlement_user::Column::TgUserId"
  )]
  User,
}

impl Related<super::entitlement_user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
