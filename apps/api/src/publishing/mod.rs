//! Print fulfillment — a thin pass-through to the print-on-demand vendor.
//!
//! The orchestrator's only responsibility is packaging the finalized page
//! sequence into the vendor's order shape; order lifecycle beyond submission
//! and status polling belongs to the vendor.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const AUTHOR: &str = "Memora";
const COVER_TYPE: &str = "hardcover";
const BOOK_SIZE: &str = "8.5x11";
const PAPER_TYPE: &str = "premium";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintBookData {
    pub title: String,
    pub author: &'static str,
    /// Object keys of the unlocked page renders, in page order.
    pub pages: Vec<String>,
    pub cover_type: &'static str,
    pub size: &'static str,
    pub paper_type: &'static str,
    pub color: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintOrder {
    pub book_data: PrintBookData,
    pub shipping: ShippingAddress,
    pub quantity: u32,
}

impl PrintOrder {
    pub fn new(title: String, pages: Vec<String>, shipping: ShippingAddress) -> Self {
        Self {
            book_data: PrintBookData {
                title,
                author: AUTHOR,
                pages,
                cover_type: COVER_TYPE,
                size: BOOK_SIZE,
                paper_type: PAPER_TYPE,
                color: true,
            },
            shipping,
            quantity: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintOrderReceipt {
    pub order_id: String,
    pub status: String,
}

#[async_trait]
pub trait PrintFulfillment: Send + Sync {
    async fn submit_order(&self, order: &PrintOrder) -> Result<PrintOrderReceipt, AppError>;
    async fn order_status(&self, order_id: &str) -> Result<PrintOrderReceipt, AppError>;
}

#[derive(Clone)]
pub struct PrintClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl PrintClient {
    pub fn new(api_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl PrintFulfillment for PrintClient {
    async fn submit_order(&self, order: &PrintOrder) -> Result<PrintOrderReceipt, AppError> {
        let url = format!("{}/orders", self.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(order)
            .send()
            .await
            .map_err(|e| AppError::PrintOrder(format!("order submission failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PrintOrder(format!(
                "order submission returned {status}: {body}"
            )));
        }

        response
            .json::<PrintOrderReceipt>()
            .await
            .map_err(|e| AppError::PrintOrder(format!("invalid order response: {e}")))
    }

    async fn order_status(&self, order_id: &str) -> Result<PrintOrderReceipt, AppError> {
        let url = format!("{}/orders/{order_id}", self.api_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::PrintOrder(format!("status lookup failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PrintOrder(format!(
                "status lookup returned {status}: {body}"
            )));
        }

        response
            .json::<PrintOrderReceipt>()
            .await
            .map_err(|e| AppError::PrintOrder(format!("invalid status response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_order_packaging_defaults() {
        let order = PrintOrder::new(
            "Mia and the Dinosaurs".to_string(),
            vec!["books/x/pages/001.final.png".to_string()],
            ShippingAddress {
                name: "Mia's Parent".to_string(),
                address1: "1 Main St".to_string(),
                address2: String::new(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62704".to_string(),
                country: "US".to_string(),
            },
        );

        assert_eq!(order.quantity, 1);
        assert_eq!(order.book_data.cover_type, "hardcover");
        assert_eq!(order.book_data.size, "8.5x11");
        assert!(order.book_data.color);
        assert_eq!(order.book_data.pages.len(), 1);
    }

    #[test]
    fn test_shipping_address_address2_defaults_empty() {
        let json = serde_json::json!({
            "name": "A",
            "address1": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62704",
            "country": "US"
        });
        let addr: ShippingAddress = serde_json::from_value(json).unwrap();
        assert_eq!(addr.address2, "");
    }
}
