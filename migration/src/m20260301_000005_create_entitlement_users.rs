use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(EntitlementUsers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(EntitlementUsers::TgUserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(EntitlementUsers::Status).string().not_null())
          .col(
            ColumnDef::new(EntitlementUsers::CreatedAt).date_time().not_null(),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(EntitlementUsers::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum EntitlementUsers {
  Table,
  TgUserId,
  Status,
  CreatedAt,
}
