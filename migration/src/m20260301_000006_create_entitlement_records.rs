use sea_orm_migration::prelude::*;

use super::m20260301_000005_create_entitlement_users::EntitlementUsers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(EntitlementRecords::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(EntitlementRecords::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          // at most one grant per user, overwritten on renewal
          .col(
            ColumnDef::new(EntitlementRecords::TgUserId)
              .big_integer()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(EntitlementRecords::Method).string().not_null())
          .col(
            ColumnDef::new(EntitlementRecords::ExpiresAt)
              .date_time()
              .not_null(),
          )
          .col(
            ColumnDef::new(EntitlementRecords::CreatedAt)
              .date_time()
              .not_null(),
          )
          .col(
            ColumnDef::new(EntitlementRecords::UpdatedAt)
              .date_time()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_entitlement_records_user")
              .from(EntitlementRecords::Table, EntitlementRecords::TgUserId)
              .to(EntitlementUsers::Table, EntitlementUsers::TgUserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(EntitlementRecords::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum EntitlementRecords {
  Table,
  Id,
  TgUserId,
  Method,
  ExpiresAt,
  CreatedAt,
  UpdatedAt,
}
