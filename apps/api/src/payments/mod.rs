//! Payment verification — a thin pass-through to the payment processor.
//!
//! Intent creation, checkout sessions, and webhooks live with the processor;
//! the orchestrator only needs to confirm that a payment reference succeeded
//! before unlocking a book.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::AppError;

/// A successfully settled payment reports this status.
pub const STATUS_SUCCEEDED: &str = "succeeded";

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    pub status: String,
    /// Amount in the smallest currency unit (cents).
    pub amount: i64,
}

impl PaymentVerification {
    pub fn succeeded(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }
}

#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, AppError>;
}

/// Stripe-style payment-intent lookup over HTTP.
#[derive(Clone)]
pub struct PaymentClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl PaymentClient {
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
impl PaymentVerifier for PaymentClient {
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, AppError> {
        let url = format!("{}/v1/payment_intents/{reference}", self.api_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("payment lookup failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!(
                "payment lookup returned {status}: {body}"
            )));
        }

        response
            .json::<PaymentVerification>()
            .await
            .map_err(|e| AppError::Payment(format!("invalid payment response: {e}")))
    }
}
