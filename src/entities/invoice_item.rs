//! Invoice line item entity - owned exclusively by one invoice

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_items")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub invoice_id: i64,
  pub item_name: String,
  pub quantity: i32,
  pub unit_price: Option<f64>,
  pub total_price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::invoice::Entity",
    from = "Column::InvoiceId",
    to = "super::invoice::Column::Id"
  )]
  Invoice,
}

impl Related<super::invoice::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Invoice.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
