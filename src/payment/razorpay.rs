//! Razorpay Orders API client
//!
//! Only the calls the checkout flow needs: order creation and
//! checkout signature verification.

use serde::{Deserialize, Serialize};

use super::signature::verify_checkout_signature;
use crate::config::RazorpayConfig;
use crate::error::AppError;

/// Order as returned by `POST /v1/orders`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RazorpayOrder {
    pub id: String,
    /// Amount in paise
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: serde_json::Value,
}

/// Razorpay REST client
pub struct RazorpayClient {
    http: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
    currency: String,
}

impl RazorpayClient {
    pub fn new(config: &RazorpayConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Public key id for the checkout widget
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create an order for `amount` paise
    ///
    /// # Arguments
    /// * `receipt` - Local order id, echoed back by Razorpay
    /// * `notes` - Free-form key/value pairs stored on the order
    ///
    /// # Errors
    /// `AppError::PaymentGateway` when Razorpay rejects the request
    pub async fn create_order(
        &self,
        amount: i64,
        receipt: &str,
        notes: serde_json::Value,
    ) -> Result<RazorpayOrder, AppError> {
        let url = format!("{}/v1/orders", self.api_base);
        let body = CreateOrderBody {
            amount,
            currency: &self.currency,
            receipt,
            notes,
        };

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %error_text, "Razorpay order creation failed");
            return Err(AppError::PaymentGateway(format!(
                "order creation returned {status}"
            )));
        }

        let order = response.json::<RazorpayOrder>().await?;
        tracing::debug!(razorpay_order_id = %order.id, amount, "Razorpay order created");
        Ok(order)
    }

    /// Verify the signature returned by the checkout widget
    pub fn verify_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), AppError> {
        verify_checkout_signature(&self.key_secret, order_id, payment_id, signature)
    }
}
