//! Receipt extraction boundary
//!
//! The AI extraction service is an external collaborator; this module only
//! fixes the wire shape the core consumes and ships a thin HTTP client for
//! whatever endpoint is configured.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedInvoice {
  pub shop_name: String,
  pub invoice_date: NaiveDate,
  pub total_amount: f64,
  pub transaction_category: Option<String>,
  pub items: Vec<ExtractedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedItem {
  pub name: String,
  pub quantity: i32,
  pub unit_price: Option<f64>,
  pub total_price: f64,
}

#[async_trait]
pub trait InvoiceExtractor: Send + Sync {
  async fn extract(&self, image: &[u8]) -> Result<ExtractedInvoice>;
}

#[derive(Debug, Clone)]
pub struct HttpExtractor {
  client: reqwest::Client,
  endpoint: String,
}

impl HttpExtractor {
  pub fn new(endpoint: &str) -> Self {
    Self { client: reqwest::Client::new(), endpoint: endpoint.to_string() }
  }
}

#[async_trait]
impl InvoiceExtractor for HttpExtractor {
  async fn extract(&self, image: &[u8]) -> Result<ExtractedInvoice> {
    let payload = json::json!({ "image": STANDARD.encode(image) });

    let response = self
      .client
      .post(&self.endpoint)
      .json(&payload)
      .send()
      .await
      .map_err(|err| Error::Extraction(err.to_string()))?;

    if !response.status().is_success() {
      return Err(Error::Extraction(format!(
        "extraction service returned {}",
        response.status()
      )));
    }

    response
      .json::<ExtractedInvoice>()
      .await
      .map_err(|err| Error::Extraction(err.to_string()))
  }
}
