//! Deal-backed coupon evaluation.
//!
//! A coupon code names a [deal](DealTerms): a promotional price for one
//! product (or any product) inside an optional time window. The discount a
//! coupon grants is the per-unit saving times the quantity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, round_paise};

/// Canonical form of a coupon code: trimmed and upper-cased.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The parts of a deal that decide whether its coupon applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealTerms {
    /// `None` means the deal applies to any product.
    pub product_id: Option<ProductId>,
    pub deal_price: Decimal,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl DealTerms {
    /// Whether `now` falls inside the deal's window. Open ends are unbounded.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|start| start <= now)
            && self.expires_at.is_none_or(|end| now < end)
    }
}

/// Why a coupon was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    NotFound,
    Inactive,
    NotStarted,
    Expired,
    WrongProduct,
    NoSaving,
}

/// Result of checking a coupon against a product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CouponOutcome {
    pub valid: bool,
    pub discount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponRejection>,
}

impl CouponOutcome {
    const fn rejected(reason: CouponRejection) -> Self {
        Self {
            valid: false,
            discount: Decimal::ZERO,
            reason: Some(reason),
        }
    }
}

/// Evaluate a coupon.
///
/// `deal` is `None` when no deal carries the code.
#[must_use]
pub fn evaluate(
    deal: Option<&DealTerms>,
    product_id: ProductId,
    unit_price: Decimal,
    quantity: u32,
    now: DateTime<Utc>,
) -> CouponOutcome {
    let Some(deal) = deal else {
        return CouponOutcome::rejected(CouponRejection::NotFound);
    };

    if !deal.is_active {
        return CouponOutcome::rejected(CouponRejection::Inactive);
    }
    if deal.starts_at.is_some_and(|start| now < start) {
        return CouponOutcome::rejected(CouponRejection::NotStarted);
    }
    if deal.expires_at.is_some_and(|end| now >= end) {
        return CouponOutcome::rejected(CouponRejection::Expired);
    }
    if deal.product_id.is_some_and(|id| id != product_id) {
        return CouponOutcome::rejected(CouponRejection::WrongProduct);
    }
    if deal.deal_price >= unit_price {
        return CouponOutcome::rejected(CouponRejection::NoSaving);
    }

    CouponOutcome {
        valid: true,
        discount: round_paise((unit_price - deal.deal_price) * Decimal::from(quantity)),
        reason: None,
    }
}
