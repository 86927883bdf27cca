//! Invoice entity - one purchase record extracted from a receipt image

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  /// Owning platform user; null for legacy rows imported before ownership
  /// existed, and reset to null when the owner row is removed.
  pub owner_id: Option<i64>,
  pub shop_name: String,
  pub invoice_date: NaiveDate,
  pub total_amount: f64,
  pub transaction_category: Option<String>,
  pub processed_at: NaiveDateTime,
  pub image_path: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::platform_user::Entity",
    from = "Column::OwnerId",
    to = "super::platform_user::Column::Id"
  )]
  Owner,
  #[sea_orm(has_many = "super::invoice_item::Entity")]
  Items,
}

impl Related<super::platform_user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Owner.def()
  }
}

impl Related<super::invoice_item::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Items.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
