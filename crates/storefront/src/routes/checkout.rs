//! Checkout session route handlers.
//!
//! Starting checkout fixes the product and quantity inside a signed,
//! short-lived token. Quotes are always computed from the token's claims,
//! never from numbers the client sends back.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sonic_core::ProductId;

use crate::error::Result;
use crate::middleware::CheckoutSession;
use crate::services::Checkout;
use crate::services::checkout::CheckoutSummary;
use crate::services::checkout_session::IssuedSession;
use crate::state::AppState;

/// Request body for `POST /api/checkout/session`.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Request body for `POST /api/checkout/quote`.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// A checkout summary together with the session countdown.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub summary: CheckoutSummary,
    pub expires_in_secs: i64,
}

/// `POST /api/checkout/session`
#[instrument(skip(state))]
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<IssuedSession>)> {
    Checkout::new(state.pool(), state.shipping())
        .product_for(req.product_id, req.quantity)
        .await?;

    let issued = state.sessions().issue(req.product_id, req.quantity, Utc::now())?;

    tracing::info!(
        product_id = %req.product_id,
        quantity = req.quantity,
        expires_in_secs = issued.expires_in_secs,
        "Checkout session started"
    );

    Ok((StatusCode::CREATED, Json(issued)))
}

/// `GET /api/checkout/session`
#[instrument(skip_all, fields(product_id = %claims.product_id))]
pub async fn show_session(
    State(state): State<AppState>,
    CheckoutSession(claims): CheckoutSession,
) -> Result<Json<SessionView>> {
    let now = Utc::now();
    let summary = Checkout::new(state.pool(), state.shipping())
        .summary(claims.product_id, claims.quantity, None, now)
        .await?;

    Ok(Json(SessionView {
        summary,
        expires_in_secs: claims.expires_in_secs(now),
    }))
}

/// `POST /api/checkout/quote`
///
/// Prices both payment methods, optionally with a coupon. An inapplicable
/// coupon is reported in the response rather than failing the quote.
#[instrument(skip_all, fields(product_id = %claims.product_id))]
pub async fn quote(
    State(state): State<AppState>,
    CheckoutSession(claims): CheckoutSession,
    body: Option<Json<QuoteRequest>>,
) -> Result<Json<SessionView>> {
    let Json(req) = body.unwrap_or_default();
    let now = Utc::now();

    let summary = Checkout::new(state.pool(), state.shipping())
        .summary(claims.product_id, claims.quantity, req.coupon_code.as_deref(), now)
        .await?;

    Ok(Json(SessionView {
        summary,
        expires_in_secs: claims.expires_in_secs(now),
    }))
}
