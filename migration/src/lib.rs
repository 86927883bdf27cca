pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_platform_users;
mod m20260301_000002_create_invoices;
mod m20260301_000003_create_invoice_items;
mod m20260301_000004_create_budget_limits;
mod m20260301_000005_create_entitlement_users;
mod m20260301_000006_create_entitlement_records;
mod m20260301_000007_create_activation_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_platform_users::Migration),
      Box::new(m20260301_000002_create_invoices::Migration),
      Box::new(m20260301_000003_create_invoice_items::Migration),
      Box::new(m20260301_000004_create_budget_limits::Migration),
      Box::new(m20260301_000005_create_entitlement_users::Migration),
      Box::new(m20260301_000006_create_entitlement_records::Migration),
      Box::new(m20260301_000007_create_activation_tokens::Migration),
    ]
  }
}
