use sea_orm_migration::prelude::*;

use super::m20260301_000002_create_invoices::Invoices;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(InvoiceItems::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(InvoiceItems::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(InvoiceItems::InvoiceId).big_integer().not_null())
          .col(ColumnDef::new(InvoiceItems::ItemName).string().not_null())
          .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
          .col(ColumnDef::new(InvoiceItems::UnitPrice).double().null())
          .col(ColumnDef::new(InvoiceItems::TotalPrice).double().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_invoice_items_invoice")
              .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
              .to(Invoices::Table, Invoices::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum InvoiceItems {
  Table,
  Id,
  InvoiceId,
  ItemName,
  Quantity,
  UnitPrice,
  TotalPrice,
}
