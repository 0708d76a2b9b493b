//! Razorpay payment flow and reward spins.
//!
//! # Prepaid checkout
//!
//! ```text
//! POST /api/payment/create-order  session token -> pending order + Razorpay order
//!   (browser widget collects payment)
//! POST /api/payment/verify        widget signature -> order paid/placed or failed
//! POST /api/payment/webhook       Razorpay server-to-server events
//! ```
//!
//! The webhook and the verify call can race. Both are idempotent on the
//! order row, so whichever lands second is a no-op.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use sonic_core::pricing::PriceQuote;
use sonic_core::{CURRENCY, OrderStatus, PaymentMethod};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{CheckoutSession, RequestId};
use crate::models::Order;
use crate::routes::orders::{CustomerForm, place_order};
use crate::state::AppState;

/// Header carrying the webhook signature.
const WEBHOOK_SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Response of `POST /api/payment/create-order`.
#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub order_number: String,
    pub razorpay_order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: &'static str,
    pub key_id: String,
}

/// `POST /api/payment/create-order`
#[instrument(skip_all, fields(product_id = %claims.product_id, quantity = claims.quantity))]
pub async fn create_order(
    State(state): State<AppState>,
    CheckoutSession(claims): CheckoutSession,
    Json(form): Json<CustomerForm>,
) -> Result<Json<CreatePaymentResponse>> {
    let (order, quote) = place_order(
        &state,
        &claims,
        form,
        PaymentMethod::Prepaid,
        OrderStatus::Pending,
    )
    .await?;
    let repo = OrderRepository::new(state.pool());

    let amount = match gateway_amount(&quote) {
        Ok(amount) => amount,
        Err(e) => {
            repo.discard_unpaid(order.id).await?;
            return Err(e);
        }
    };

    let gateway_order = match state
        .razorpay()
        .create_order(amount, &order.order_number)
        .await
    {
        Ok(gateway_order) => gateway_order,
        Err(e) => {
            // The row has no gateway order and can never be paid
            let discarded = repo.discard_unpaid(order.id).await?;
            warn!(
                order_number = %order.order_number,
                discarded,
                error = %e,
                "Razorpay order creation failed"
            );
            return Err(e.into());
        }
    };

    repo.set_razorpay_order_id(order.id, &gateway_order.id)
        .await?;

    info!(
        order_number = %order.order_number,
        razorpay_order_id = %gateway_order.id,
        amount,
        "Prepaid order awaiting payment"
    );

    Ok(Json(CreatePaymentResponse {
        order_number: order.order_number,
        razorpay_order_id: gateway_order.id,
        amount,
        currency: CURRENCY,
        key_id: state.razorpay().key_id().to_string(),
    }))
}

fn gateway_amount(quote: &PriceQuote) -> Result<i64> {
    quote
        .total_paise()
        .filter(|paise| *paise > 0)
        .ok_or_else(|| AppError::Internal(format!("unpayable total {}", quote.total)))
}

/// Request body for `POST /api/payment/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// `POST /api/payment/verify`
#[instrument(skip_all, fields(razorpay_order_id = %req.razorpay_order_id))]
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());

    let valid = state.razorpay().verify_payment_signature(
        &req.razorpay_order_id,
        &req.razorpay_payment_id,
        &req.razorpay_signature,
    );

    if !valid {
        warn!("Payment signature mismatch");
        repo.mark_failed(&req.razorpay_order_id).await?;
        return Err(AppError::BadRequest(
            "Payment verification failed".to_string(),
        ));
    }

    let order = repo
        .mark_paid(&req.razorpay_order_id, &req.razorpay_payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    add_breadcrumb(
        "payment",
        "Payment verified",
        Some(&[("order_number", order.order_number.as_str())]),
    );
    info!(order_number = %order.order_number, "Payment verified");

    Ok(Json(order))
}

/// The parts of a webhook delivery we read.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    payload: WebhookPayload,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    payment: Option<WebhookEntity>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntity {
    entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    id: String,
    order_id: Option<String>,
}

/// Acknowledgement returned to Razorpay.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// `POST /api/payment/webhook`
///
/// The signature covers the raw body, so the body is taken as bytes and
/// parsed only after it has been verified.
#[instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn webhook(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    if !state.razorpay().webhooks_enabled() {
        return Err(AppError::NotFound("Webhooks are not configured".to_string()));
    }

    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature".to_string()))?;

    if !state.razorpay().verify_webhook_signature(&body, signature) {
        warn!("Webhook signature mismatch");
        return Err(AppError::BadRequest("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook: {e}")))?;

    let Some(payment) = event.payload.payment.map(|p| p.entity) else {
        return Ok(Json(WebhookAck { status: "ignored" }));
    };
    let Some(razorpay_order_id) = payment.order_id.as_deref() else {
        return Ok(Json(WebhookAck { status: "ignored" }));
    };

    let repo = OrderRepository::new(state.pool());
    let updated = match event.event.as_str() {
        "payment.captured" => repo.mark_paid(razorpay_order_id, &payment.id).await?,
        "payment.failed" => repo.mark_failed(razorpay_order_id).await?,
        other => {
            info!(event = other, "Ignoring webhook event");
            return Ok(Json(WebhookAck { status: "ignored" }));
        }
    };

    match updated {
        Some(order) => info!(
            event = %event.event,
            order_number = %order.order_number,
            payment_status = %order.payment_status,
            "Webhook applied"
        ),
        None => info!(event = %event.event, razorpay_order_id, "Webhook matched no pending order"),
    }

    Ok(Json(WebhookAck { status: "ok" }))
}

/// Request body for `POST /api/payment/spin-reward`.
#[derive(Debug, Deserialize)]
pub struct SpinRequest {
    pub order_number: String,
}

/// Result of a spin. `segment_index` lets the wheel stop on the right slice.
#[derive(Debug, Serialize)]
pub struct SpinResponse {
    pub order_number: String,
    pub reward: String,
    pub segment_index: Option<usize>,
    pub already_spun: bool,
}

/// `POST /api/payment/spin-reward`
///
/// Only completed orders may spin, and only once. Repeat calls return the
/// stored reward.
#[instrument(skip(state))]
pub async fn spin_reward(
    State(state): State<AppState>,
    Json(req): Json<SpinRequest>,
) -> Result<Json<SpinResponse>> {
    let order_number = req.order_number.trim().to_ascii_uppercase();
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get_by_number(&order_number)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if !order.is_completed() {
        return Err(AppError::Conflict(
            "Order is not complete yet".to_string(),
        ));
    }

    if let Some(reward) = order.reward {
        return Ok(Json(stored_reward(&state, order_number, reward)));
    }

    let draw = state.rewards().pick(&mut rand::rng());

    if repo.set_reward_once(&order_number, &draw.label).await?.is_some() {
        info!(order_number = %order_number, reward = %draw.label, "Reward drawn");
        return Ok(Json(SpinResponse {
            order_number,
            reward: draw.label,
            segment_index: Some(draw.index),
            already_spun: false,
        }));
    }

    // A concurrent spin stored its reward first
    let reward = repo
        .get_by_number(&order_number)
        .await?
        .and_then(|o| o.reward)
        .ok_or_else(|| AppError::Internal(format!("reward missing on {order_number}")))?;

    Ok(Json(stored_reward(&state, order_number, reward)))
}

fn stored_reward(state: &AppState, order_number: String, reward: String) -> SpinResponse {
    let segment_index = state
        .rewards()
        .segments()
        .iter()
        .position(|s| s.label == reward);

    SpinResponse {
        order_number,
        reward,
        segment_index,
        already_spun: true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use sonic_core::pricing::{QuantityBounds, QuoteInput, quote};

    use super::*;

    fn sample_quote() -> PriceQuote {
        quote(&QuoteInput {
            unit_price: Decimal::from(4500),
            quantity: 1,
            bounds: QuantityBounds::new(1, 10).unwrap(),
            discount: Decimal::ZERO,
            payment_method: PaymentMethod::Prepaid,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_captured_webhook() {
        let body = serde_json::json!({
            "entity": "event",
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "amount": 122_759,
                        "currency": "INR",
                        "status": "captured"
                    }
                }
            }
        });

        let event: WebhookEvent = serde_json::from_value(body).unwrap();
        assert_eq!(event.event, "payment.captured");
        let payment = event.payload.payment.unwrap().entity;
        assert_eq!(payment.id, "pay_29QQoUBi66xm2f");
        assert_eq!(payment.order_id.as_deref(), Some("order_9A33XWu170gUtm"));
    }

    #[test]
    fn test_parse_event_without_payment() {
        let body = serde_json::json!({ "event": "order.paid", "payload": {} });
        let event: WebhookEvent = serde_json::from_value(body).unwrap();
        assert!(event.payload.payment.is_none());
    }

    #[test]
    fn test_gateway_amount() {
        let mut quote = sample_quote();
        quote.total = Decimal::new(122_759, 2);
        assert_eq!(gateway_amount(&quote).unwrap(), 122_759);

        quote.total = Decimal::ZERO;
        assert!(gateway_amount(&quote).is_err());
    }
}
