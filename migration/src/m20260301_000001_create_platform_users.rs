use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(PlatformUsers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PlatformUsers::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(PlatformUsers::Platform).string().not_null())
          .col(
            ColumnDef::new(PlatformUsers::PlatformUserId).string().not_null(),
          )
          .col(ColumnDef::new(PlatformUsers::DisplayName).string().null())
          .col(ColumnDef::new(PlatformUsers::CreatedAt).date_time().not_null())
          .col(
            ColumnDef::new(PlatformUsers::LastActiveAt).date_time().not_null(),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_platform_users_identity")
          .table(PlatformUsers::Table)
          .col(PlatformUsers::Platform)
          .col(PlatformUsers::PlatformUserId)
          .unique()
          .if_not_exists()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(PlatformUsers::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum PlatformUsers {
  Table,
  Id,
  Platform,
  PlatformUserId,
  DisplayName,
  CreatedAt,
  LastActiveAt,
}
