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
          .table(BudgetLimits::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(BudgetLimits::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          // one limit row per user, replaced on every /set_limit
          .col(
            ColumnDef::new(BudgetLimits::UserId)
              .big_integer()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(BudgetLimits::MonthlyLimit).double().not_null())
          .col(ColumnDef::new(BudgetLimits::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(BudgetLimits::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_budget_limits_user")
              .from(BudgetLimits::Table, BudgetLimits::UserId)
              .to(PlatformUsers::Table, PlatformUsers::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(BudgetLimits::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum BudgetLimits {
  Table,
  Id,
  UserId,
  MonthlyLimit,
  CreatedAt,
  UpdatedAt,
}
