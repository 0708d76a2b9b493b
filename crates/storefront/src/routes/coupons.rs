//! Coupon validation handler.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use sonic_core::ProductId;
use sonic_core::coupon::CouponOutcome;

use crate::error::Result;
use crate::services::Checkout;
use crate::state::AppState;

/// Request body for `POST /api/coupons/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// `POST /api/coupons/validate`
///
/// Always `200` for a known product: an inapplicable code comes back as
/// `{ "valid": false, "discount": "0", "reason": ... }`.
#[instrument(skip(state), fields(code = %req.code))]
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<CouponOutcome>> {
    let checkout = Checkout::new(state.pool(), state.shipping());
    let product = checkout.product_for(req.product_id, req.quantity).await?;
    let applied = checkout
        .evaluate_coupon(&req.code, &product, req.quantity, Utc::now())
        .await?;

    Ok(Json(applied.outcome))
}
