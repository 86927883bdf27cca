use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(ActivationTokens::Table)
          .if_not_exists()
          // the signed token string is its own key
          .col(
            ColumnDef::new(ActivationTokens::Token)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(ActivationTokens::IsUsed)
              .boolean()
              .not_null()
              .default(false),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ActivationTokens::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ActivationTokens {
  Table,
  Token,
  IsUsed,
}
