//! Invoice repository - atomic inserts, filtered queries, server-side
//! aggregation

use sea_orm::{
  FromQueryResult,
  sea_query::{Alias, Expr, Func},
};

use crate::{
  entities::{invoice, invoice_item},
  extract::ExtractedInvoice,
  prelude::*,
};

pub struct Invoices<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
  pub owner: Option<i64>,
  /// Inclusive lower bound on the invoice date.
  pub since: Option<NaiveDate>,
  /// Exclusive upper bound on the invoice date.
  pub until: Option<NaiveDate>,
  pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpendAggregate {
  pub total: f64,
  pub count: i64,
  pub average: f64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct ShopSpend {
  pub shop_name: String,
  pub total: f64,
}

#[derive(Debug, FromQueryResult)]
struct RawAggregate {
  total: Option<f64>,
  count: i64,
  average: Option<f64>,
}

impl<'a> Invoices<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Persist an extracted invoice and all of its line items as one unit.
  /// Validation failures and mid-flight backend errors both leave the
  /// store untouched.
  pub async fn insert(
    &self,
    owner_id: Option<i64>,
    extracted: &ExtractedInvoice,
    image_path: Option<&str>,
  ) -> Result<i64> {
    if extracted.total_amount < 0.0 {
      return Err(Error::Validation(
        "invoice total must be non-negative".into(),
      ));
    }
    for item in &extracted.items {
      if item.quantity <= 0 {
        return Err(Error::Validation(format!(
          "item '{}' has a non-positive quantity",
          item.name
        )));
      }
      if item.total_price < 0.0 || item.unit_price.is_some_and(|p| p < 0.0) {
        return Err(Error::Validation(format!(
          "item '{}' has a negative price",
          item.name
        )));
      }
    }

    let txn = self.db.begin().await.map_err(Error::db("insert_invoice"))?;

    let invoice = invoice::ActiveModel {
      owner_id: Set(owner_id),
      shop_name: Set(extracted.shop_name.clone()),
      invoice_date: Set(extracted.invoice_date),
      total_amount: Set(extracted.total_amount),
      transaction_category: Set(extracted.transaction_category.clone()),
      processed_at: Set(Utc::now().naive_utc()),
      image_path: Set(image_path.map(str::to_string)),
      ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(Error::db("insert_invoice"))?;

    for item in &extracted.items {
      invoice_item::ActiveModel {
        invoice_id: Set(invoice.id),
        item_name: Set(item.name.clone()),
        quantity: Set(item.quantity),
        unit_price: Set(item.unit_price),
        total_price: Set(item.total_price),
        ..Default::default()
      }
      .insert(&txn)
      .await
      .map_err(Error::db("insert_invoice_item"))?;
    }

    txn.commit().await.map_err(Error::db("insert_invoice"))?;

    debug!(
      invoice = invoice.id,
      shop = %invoice.shop_name,
      "invoice recorded"
    );
    Ok(invoice.id)
  }

  /// Invoices matching the filter, most recent first. The ordering tie-break
  /// on id keeps results identical across backends.
  pub async fn query(
    &self,
    filter: InvoiceFilter,
  ) -> Result<Vec<invoice::Model>> {
    let mut query = invoice::Entity::find()
      .order_by_desc(invoice::Column::InvoiceDate)
      .order_by_desc(invoice::Column::Id);

    if let Some(owner) = filter.owner {
      query = query.filter(invoice::Column::OwnerId.eq(owner));
    }
    if let Some(since) = filter.since {
      query = query.filter(invoice::Column::InvoiceDate.gte(since));
    }
    if let Some(until) = filter.until {
      query = query.filter(invoice::Column::InvoiceDate.lt(until));
    }
    if let Some(limit) = filter.limit {
      query = query.limit(limit);
    }

    query.all(self.db).await.map_err(Error::db("query_invoices"))
  }

  #[allow(dead_code)]
  pub async fn items(
    &self,
    invoice_id: i64,
  ) -> Result<Vec<invoice_item::Model>> {
    invoice_item::Entity::find()
      .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
      .order_by_asc(invoice_item::Column::Id)
      .all(self.db)
      .await
      .map_err(Error::db("query_invoice_items"))
  }

  /// Total/count/average over the window, computed by the backend. An empty
  /// window is a zero aggregate, not an error.
  pub async fn aggregate_spend(
    &self,
    owner: Option<i64>,
    start: NaiveDate,
    end: Option<NaiveDate>,
  ) -> Result<SpendAggregate> {
    let mut query = invoice::Entity::find()
      .select_only()
      .column_as(invoice::Column::TotalAmount.sum(), "total")
      .column_as(invoice::Column::Id.count(), "count")
      .column_as(
        Expr::expr(Func::avg(Expr::col(invoice::Column::TotalAmount))),
        "average",
      )
      .filter(invoice::Column::InvoiceDate.gte(start));

    if let Some(end) = end {
      query = query.filter(invoice::Column::InvoiceDate.lt(end));
    }
    if let Some(owner) = owner {
      query = query.filter(invoice::Column::OwnerId.eq(owner));
    }

    let raw = query
      .into_model::<RawAggregate>()
      .one(self.db)
      .await
      .map_err(Error::db("aggregate_spend"))?;

    Ok(match raw {
      Some(raw) => SpendAggregate {
        total: raw.total.unwrap_or(0.0),
        count: raw.count,
        average: raw.average.unwrap_or(0.0),
      },
      None => SpendAggregate::default(),
    })
  }

  /// Per-shop totals over the window, biggest spender first.
  pub async fn spend_by_shop(
    &self,
    owner: Option<i64>,
    start: NaiveDate,
    end: Option<NaiveDate>,
    top: u64,
  ) -> Result<Vec<ShopSpend>> {
    let mut query = invoice::Entity::find()
      .select_only()
      .column(invoice::Column::ShopName)
      .column_as(invoice::Column::TotalAmount.sum(), "total")
      .filter(invoice::Column::InvoiceDate.gte(start));

    if let Some(end) = end {
      query = query.filter(invoice::Column::InvoiceDate.lt(end));
    }
    if let Some(owner) = owner {
      query = query.filter(invoice::Column::OwnerId.eq(owner));
    }

    query
      .group_by(invoice::Column::ShopName)
      .order_by_desc(Expr::col(Alias::new("total")))
      .limit(top)
      .into_model::<ShopSpend>()
      .all(self.db)
      .await
      .map_err(Error::db("spend_by_shop"))
  }
}

#[cfg(test)]
mod tests {
  use sea_orm::{DbBackend, Schema};

  use super::*;
  use crate::{entities::platform_user, extract::ExtractedItem};

  async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(platform_user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(invoice::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(invoice_item::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    seed_users(&db, &[1, 2]).await;

    db
  }

  async fn seed_users(db: &DatabaseConnection, ids: &[i64]) {
    let now = Utc::now().naive_utc();
    for &id in ids {
      platform_user::Entity::insert(platform_user::ActiveModel {
        id: Set(id),
        platform: Set("test".into()),
        platform_user_id: Set(id.to_string()),
        display_name: Set(None),
        created_at: Set(now),
        last_active_at: Set(now),
      })
      .exec(db)
      .await
      .unwrap();
    }
  }

  fn receipt(shop: &str, date: &str, total: f64) -> ExtractedInvoice {
    ExtractedInvoice {
      shop_name: shop.to_string(),
      invoice_date: date.parse().unwrap(),
      total_amount: total,
      transaction_category: Some("retail".into()),
      items: vec![ExtractedItem {
        name: "item".into(),
        quantity: 1,
        unit_price: Some(total),
        total_price: total,
      }],
    }
  }

  #[tokio::test]
  async fn insert_persists_invoice_with_items() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    let mut extracted = receipt("Toko Sinar", "2026-03-02", 125_000.0);
    extracted.items.push(ExtractedItem {
      name: "rice 5kg".into(),
      quantity: 2,
      unit_price: Some(60_000.0),
      total_price: 120_000.0,
    });

    let id = sv.insert(Some(1), &extracted, Some("photos/a.jpg")).await.unwrap();

    let items = sv.items(id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].item_name, "rice 5kg");
  }

  #[tokio::test]
  async fn bad_line_item_leaves_no_partial_invoice() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    let mut extracted = receipt("Toko Sinar", "2026-03-02", 50_000.0);
    extracted.items.push(ExtractedItem {
      name: "phantom".into(),
      quantity: -1,
      unit_price: None,
      total_price: 10_000.0,
    });

    assert!(matches!(
      sv.insert(None, &extracted, None).await,
      Err(Error::Validation(_))
    ));
    assert_eq!(invoice::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(invoice_item::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn negative_total_is_rejected() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    let extracted = receipt("Toko Sinar", "2026-03-02", -1.0);
    assert!(matches!(
      sv.insert(None, &extracted, None).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn query_orders_most_recent_first_and_scopes_by_owner() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    sv.insert(Some(1), &receipt("Older", "2026-03-01", 10.0), None)
      .await
      .unwrap();
    sv.insert(Some(1), &receipt("Newer", "2026-03-05", 20.0), None)
      .await
      .unwrap();
    sv.insert(Some(2), &receipt("Other user", "2026-03-09", 30.0), None)
      .await
      .unwrap();

    let mine = sv
      .query(InvoiceFilter { owner: Some(1), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].shop_name, "Newer");
    assert_eq!(mine[1].shop_name, "Older");
  }

  #[tokio::test]
  async fn query_date_window_is_inclusive_exclusive() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    sv.insert(None, &receipt("In", "2026-03-01", 10.0), None).await.unwrap();
    sv.insert(None, &receipt("Out", "2026-04-01", 10.0), None).await.unwrap();

    let march = sv
      .query(InvoiceFilter {
        since: Some("2026-03-01".parse().unwrap()),
        until: Some("2026-04-01".parse().unwrap()),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].shop_name, "In");
  }

  #[tokio::test]
  async fn empty_window_aggregates_to_zero() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    let agg = sv
      .aggregate_spend(Some(7), "2026-03-01".parse().unwrap(), None)
      .await
      .unwrap();
    assert_eq!(agg, SpendAggregate::default());
  }

  #[tokio::test]
  async fn aggregate_sums_counts_and_averages() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    sv.insert(Some(1), &receipt("A", "2026-03-02", 600_000.0), None)
      .await
      .unwrap();
    sv.insert(Some(1), &receipt("B", "2026-03-20", 350_000.0), None)
      .await
      .unwrap();
    sv.insert(Some(1), &receipt("C", "2026-04-02", 999_999.0), None)
      .await
      .unwrap();

    let agg = sv
      .aggregate_spend(
        Some(1),
        "2026-03-01".parse().unwrap(),
        Some("2026-04-01".parse().unwrap()),
      )
      .await
      .unwrap();

    assert_eq!(agg.count, 2);
    assert!((agg.total - 950_000.0).abs() < f64::EPSILON);
    assert!((agg.average - 475_000.0).abs() < f64::EPSILON);
  }

  #[tokio::test]
  async fn shop_breakdown_ranks_by_total() {
    let db = setup_test_db().await;
    let sv = Invoices::new(&db);

    sv.insert(None, &receipt("Warung Kopi", "2026-03-02", 40.0), None)
      .await
      .unwrap();
    sv.insert(None, &receipt("Supermarket", "2026-03-03", 100.0), None)
      .await
      .unwrap();
    sv.insert(None, &receipt("Warung Kopi", "2026-03-04", 35.0), None)
      .await
      .unwrap();

    let shops = sv
      .spend_by_shop(None, "2026-03-01".parse().unwrap(), None, 5)
      .await
      .unwrap();

    assert_eq!(shops.len(), 2);
    assert_eq!(shops[0].shop_name, "Supermarket");
    assert!((shops[1].total - 75.0).abs() < f64::EPSILON);
  }
}
