//! Razorpay payment gateway client.
//!
//! Covers the three touch points of a prepaid checkout:
//! - creating a gateway order for the amount we computed
//! - verifying the signature the browser widget returns after payment
//! - verifying webhook deliveries

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, instrument};

use sonic_core::CURRENCY;

use crate::config::RazorpayConfig;

/// Errors from the Razorpay API.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Body of `POST /v1/orders`.
#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: OrderNotes<'a>,
}

#[derive(Debug, Serialize)]
struct OrderNotes<'a> {
    order_number: &'a str,
}

/// A Razorpay order as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    description: Option<String>,
}

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: SecretString,
    webhook_secret: Option<SecretString>,
}

impl RazorpayClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig) -> Result<Self, RazorpayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    /// Public key id for the browser checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Whether webhook deliveries can be verified.
    #[must_use]
    pub const fn webhooks_enabled(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Create a gateway order for `amount_paise`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self), fields(receipt = %receipt))]
    pub async fn create_order(
        &self,
        amount_paise: i64,
        receipt: &str,
    ) -> Result<RazorpayOrder, RazorpayError> {
        let url = format!("{}/v1/orders", self.api_base);

        let body = CreateOrderRequest {
            amount: amount_paise,
            currency: CURRENCY,
            receipt,
            notes: OrderNotes {
                order_number: receipt,
            },
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.error.description)
                .unwrap_or(text);
            return Err(RazorpayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: RazorpayOrder = response
            .json()
            .await
            .map_err(|e| RazorpayError::Parse(e.to_string()))?;

        debug!(razorpay_order_id = %order.id, "Razorpay order created");

        Ok(order)
    }

    /// Check the signature returned by the checkout widget.
    ///
    /// Razorpay signs `"{order_id}|{payment_id}"` with the key secret.
    #[must_use]
    pub fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let payload = format!("{order_id}|{payment_id}");
        verify_hmac_sha256(self.key_secret.expose_secret(), payload.as_bytes(), signature)
    }

    /// Check the `X-Razorpay-Signature` header of a webhook delivery.
    ///
    /// Always `false` when no webhook secret is configured.
    #[must_use]
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        self.webhook_secret
            .as_ref()
            .is_some_and(|secret| verify_hmac_sha256(secret.expose_secret(), body, signature))
    }
}

/// Hex-encoded HMAC-SHA256 of `payload`.
#[must_use]
pub fn sign_hmac_sha256(secret: &str, payload: &[u8]) -> String {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn verify_hmac_sha256(secret: &str, payload: &[u8], signature: &str) -> bool {
    let expected = sign_hmac_sha256(secret, payload);
    !expected.is_empty() && constant_time_compare(&expected, signature.trim())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    fn client() -> RazorpayClient {
        RazorpayClient::new(&test_config().razorpay).unwrap()
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_known_hmac_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            sign_hmac_sha256("Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_payment_signature() {
        let client = client();
        let signature = sign_hmac_sha256("thisIsNotARealKeySecret9", b"order_IluGWxBm9U8zJ8|pay_IH4NVgf4Dreq1l");

        assert!(client.verify_payment_signature("order_IluGWxBm9U8zJ8", "pay_IH4NVgf4Dreq1l", &signature));
        assert!(!client.verify_payment_signature("order_IluGWxBm9U8zJ8", "pay_other", &signature));
        assert!(!client.verify_payment_signature("order_IluGWxBm9U8zJ8", "pay_IH4NVgf4Dreq1l", "deadbeef"));
    }

    #[test]
    fn test_webhook_signature() {
        let client = client();
        let body = br#"{"event":"payment.captured"}"#;
        let signature = sign_hmac_sha256("wh_9fQ2x!Lm7Rt4Zp8Wn3", body);

        assert!(client.verify_webhook_signature(body, &signature));
        assert!(!client.verify_webhook_signature(b"{}", &signature));
    }

    #[test]
    fn test_webhook_disabled_without_secret() {
        let mut config = test_config().razorpay;
        config.webhook_secret = None;
        let client = RazorpayClient::new(&config).unwrap();
        let body = b"{}";
        let signature = sign_hmac_sha256("wh_9fQ2x!Lm7Rt4Zp8Wn3", body);

        assert!(!client.webhooks_enabled());
        assert!(!client.verify_webhook_signature(body, &signature));
    }
}
