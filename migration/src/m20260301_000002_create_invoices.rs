use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_platform_users::PlatformUsers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Invoices::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Invoices::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Invoices::OwnerId).big_integer().null())
          .col(ColumnDef::new(Invoices::ShopName).string().not_null())
          .col(ColumnDef::new(Invoices::InvoiceDate).date().not_null())
          .col(ColumnDef::new(Invoices::TotalAmount).double().not_null())
          .col(ColumnDef::new(Invoices::TransactionCategory).string().null())
          .col(ColumnDef::new(Invoices::ProcessedAt).date_time().not_null())
          .col(ColumnDef::new(Invoices::ImagePath).string().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_invoices_owner")
              .from(Invoices::Table, Invoices::OwnerId)
              .to(PlatformUsers::Table, PlatformUsers::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    // query_invoices and aggregate_spend both scope by owner and date
    manager
      .create_index(
        Index::create()
          .name("idx_invoices_owner_date")
          .table(Invoices::Table)
          .col(Invoices::OwnerId)
          .col(Invoices::InvoiceDate)
          .if_not_exists()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Invoices::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Invoices {
  Table,
  Id,
  OwnerId,
  ShopName,
  InvoiceDate,
  TotalAmount,
  TransactionCategory,
  ProcessedAt,
  ImagePath,
}
